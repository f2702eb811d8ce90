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

#[derive(Clone, Debug)]
pub struct GetBalanceRequest {
    pub user_id: UserId,
}

impl<B, H> Service<GetBalanceRequest> for PointLedger<B, H>
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

    fn call(&mut self, req: GetBalanceRequest) -> Self::Future {
        let ledger = self.clone();
        Box::pin(async move { ledger.get_balance(req.user_id).await })
    }
}
