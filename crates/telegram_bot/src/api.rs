use api_types::{
    catalog::{
        BranchNew, DepartmentList, PaperList, PaperNew, PaperView, PriceUpdate, Prune, Pruned,
        SemesterList, YearList,
    },
    purchase::{
        BulkPurchaseNew, BulkPurchaseResult, PurchaseNew, PurchaseResult, ReconcileNew,
        ReconcileResult,
    },
    wallet::{InvoiceView, ProfileView, TelegramIds, TopUpNew},
};
use reqwest::{Client, StatusCode};
use serde::Deserialize;

#[derive(Clone, Debug)]
pub(crate) struct ApiClient {
    client: Client,
    base_url: String,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: String,
}

#[derive(Debug, thiserror::Error)]
pub(crate) enum ApiError {
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),
    #[error("{status}: {message}")]
    Server { status: StatusCode, message: String },
}

impl ApiClient {
    pub(crate) fn new(client: Client, base_url: String) -> Self {
        Self { client, base_url }
    }

    fn url(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }

    async fn read_response<TResp: for<'de> serde::Deserialize<'de>>(
        resp: reqwest::Response,
    ) -> Result<TResp, ApiError> {
        let status = resp.status();
        if status.is_success() {
            return Ok(resp.json::<TResp>().await?);
        }

        let message = match resp.json::<ErrorBody>().await {
            Ok(err) => err.error,
            Err(_) => "server error".to_string(),
        };
        Err(ApiError::Server { status, message })
    }

    async fn get_json<TResp: for<'de> serde::Deserialize<'de>>(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<TResp, ApiError> {
        let resp = self.client.get(self.url(path)).query(query).send().await?;
        Self::read_response(resp).await
    }

    async fn post_json<TReq: serde::Serialize + ?Sized, TResp: for<'de> serde::Deserialize<'de>>(
        &self,
        telegram_user_id: Option<u64>,
        path: &str,
        body: &TReq,
    ) -> Result<TResp, ApiError> {
        let mut req = self.client.post(self.url(path)).json(body);
        if let Some(id) = telegram_user_id {
            req = req.header("telegram-user-id", id.to_string());
        }

        let resp = req.send().await?;
        Self::read_response(resp).await
    }

    async fn post_json_unit<TReq: serde::Serialize + ?Sized>(
        &self,
        path: &str,
        body: &TReq,
    ) -> Result<(), ApiError> {
        let resp = self.client.post(self.url(path)).json(body).send().await?;
        let status = resp.status();
        if status.is_success() {
            return Ok(());
        }
        let message = match resp.json::<ErrorBody>().await {
            Ok(err) => err.error,
            Err(_) => "server error".to_string(),
        };
        Err(ApiError::Server { status, message })
    }

    pub(crate) async fn departments(&self) -> Result<DepartmentList, ApiError> {
        self.get_json("/catalog/departments", &[]).await
    }

    pub(crate) async fn semesters(&self, department: &str) -> Result<SemesterList, ApiError> {
        self.get_json("/catalog/semesters", &[("department", department)])
            .await
    }

    pub(crate) async fn years(
        &self,
        department: &str,
        semester: &str,
    ) -> Result<YearList, ApiError> {
        self.get_json(
            "/catalog/years",
            &[("department", department), ("semester", semester)],
        )
        .await
    }

    pub(crate) async fn papers(
        &self,
        department: &str,
        semester: &str,
        year: &str,
    ) -> Result<PaperList, ApiError> {
        self.get_json(
            "/catalog/papers",
            &[
                ("department", department),
                ("semester", semester),
                ("year", year),
            ],
        )
        .await
    }

    pub(crate) async fn new_branch(&self, payload: &BranchNew) -> Result<(), ApiError> {
        self.post_json_unit("/catalog/departments", payload).await
    }

    pub(crate) async fn new_paper(&self, payload: &PaperNew) -> Result<PaperView, ApiError> {
        self.post_json(None, "/catalog/papers", payload).await
    }

    pub(crate) async fn set_price(
        &self,
        paper_id: i64,
        payload: &PriceUpdate,
    ) -> Result<(), ApiError> {
        let resp = self
            .client
            .patch(self.url(&format!("/catalog/papers/{paper_id}/price")))
            .json(payload)
            .send()
            .await?;
        let status = resp.status();
        if status.is_success() {
            return Ok(());
        }
        let message = match resp.json::<ErrorBody>().await {
            Ok(err) => err.error,
            Err(_) => "server error".to_string(),
        };
        Err(ApiError::Server { status, message })
    }

    pub(crate) async fn prune(&self, payload: &Prune) -> Result<Pruned, ApiError> {
        self.post_json(None, "/catalog/prune", payload).await
    }

    pub(crate) async fn purchase(
        &self,
        telegram_user_id: u64,
        payload: &PurchaseNew,
    ) -> Result<PurchaseResult, ApiError> {
        self.post_json(Some(telegram_user_id), "/purchase", payload)
            .await
    }

    pub(crate) async fn purchase_bulk(
        &self,
        telegram_user_id: u64,
        payload: &BulkPurchaseNew,
    ) -> Result<BulkPurchaseResult, ApiError> {
        self.post_json(Some(telegram_user_id), "/purchaseBulk", payload)
            .await
    }

    pub(crate) async fn topup(
        &self,
        telegram_user_id: u64,
        payload: &TopUpNew,
    ) -> Result<InvoiceView, ApiError> {
        self.post_json(Some(telegram_user_id), "/topup", payload)
            .await
    }

    pub(crate) async fn reconcile(
        &self,
        telegram_user_id: u64,
        payload: &ReconcileNew,
    ) -> Result<ReconcileResult, ApiError> {
        self.post_json(Some(telegram_user_id), "/payments/reconcile", payload)
            .await
    }

    pub(crate) async fn profile(&self, telegram_user_id: u64) -> Result<ProfileView, ApiError> {
        let resp = self
            .client
            .get(self.url("/profile"))
            .header("telegram-user-id", telegram_user_id.to_string())
            .send()
            .await?;
        Self::read_response(resp).await
    }

    pub(crate) async fn telegram_ids(&self) -> Result<TelegramIds, ApiError> {
        self.get_json("/accounts/telegramIds", &[]).await
    }
}
