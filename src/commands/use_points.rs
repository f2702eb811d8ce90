use std::{
    future::Future,
    pin::Pin,
    task::{Context, Poll},
};

use tower::Service;

use crate::{
    domain::{UserBalance, UserId},
    ports::{balance::BalanceStorePort, history::HistoryLogPort},
};

use super::{Error, PointLedger};

/// Spend points from a user's balance
#[derive(Clone, Debug)]
pub struct UseRequest {
    pub user_id: UserId,
    pub amount: u64,
}

impl<B, H> Service<UseRequest> for PointLedger<B, H>
where
    B: BalanceStorePort + 'static,
    H: HistoryLogPort + 'static,
{
    type Response = UserBalance;
    type Error = Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, req: UseRequest) -> Self::Future {
        let ledger = self.clone();
        Box::pin(async move { ledger.use_points(req.user_id, req.amount).await })
    }
}
