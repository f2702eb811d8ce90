use std::{
    future::Future,
    pin::Pin,
    task::{Context, Poll},
};

use tower::Service;

use crate::{
    domain::{TransactionRecord, UserId},
    ports::{balance::BalanceStorePort, history::HistoryLogPort},
};

use super::{Error, PointLedger};

#[derive(Clone, Debug)]
pub struct GetHistoryRequest {
    pub user_id: UserId,
}

impl<B, H> Service<GetHistoryRequest> for PointLedger<B, H>
where
    B: BalanceStorePort + 'static,
    H: HistoryLogPort + 'static,
{
    type Response = Vec<TransactionRecord>;
    type Error = Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, req: GetHistoryRequest) -> Self::Future {
        let ledger = self.clone();
        Box::pin(async move { ledger.get_history(req.user_id).await })
    }
}
