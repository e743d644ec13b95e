// REST API - axum routes over a shared MoneyDao
//
// All routes live under /api. JSON bodies are wrapped in ApiResponse;
// binary payloads (icons, documents, export) are returned raw.

use crate::cache::Cached;
use crate::dao::MoneyDao;
use crate::entities::{
    Account, Card, Category, Contact, Currency, ExchangeSecurity, Icon, MoneyDocument, MoneyRecord, PeriodicPayment,
    Transaction, TransactionBuilder,
};
use crate::error::MoneyError;
use crate::filters::{Period, TransactionFilter};
use crate::reconciliation::{reconcile_statement, ReconciliationEngine, ReconciliationReport};
use crate::statements::{parse_statement, RawStatementData};
use crate::xml;
use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use log::{error, info};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex, MutexGuard};
use tower_http::cors::CorsLayer;
use uuid::Uuid;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub dao: Arc<Mutex<MoneyDao>>,
    pub engine: Arc<ReconciliationEngine>,
}

impl AppState {
    pub fn new(dao: MoneyDao, engine: ReconciliationEngine) -> Self {
        AppState {
            dao: Arc::new(Mutex::new(dao)),
            engine: Arc::new(engine),
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, MoneyDao>, ApiError> {
        self.dao
            .lock()
            .map_err(|_| ApiError::new(StatusCode::INTERNAL_SERVER_ERROR, "database lock poisoned"))
    }
}

/// API Response wrapper
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn err(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message.into()),
        }
    }
}

// ============================================================================
// ERRORS
// ============================================================================

#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    fn new(status: StatusCode, message: impl Into<String>) -> Self {
        ApiError {
            status,
            message: message.into(),
        }
    }
}

impl From<MoneyError> for ApiError {
    fn from(err: MoneyError) -> Self {
        let status = match err {
            MoneyError::NotFound { .. } => StatusCode::NOT_FOUND,
            ref e if e.is_client_error() => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        if status.is_server_error() {
            error!("Request failed: {}", err);
        }
        ApiError::new(status, err.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(ApiResponse::<()>::err(self.message))).into_response()
    }
}

type ApiResult<T> = Result<Json<ApiResponse<T>>, ApiError>;

fn ok<T>(data: T) -> ApiResult<T> {
    Ok(Json(ApiResponse::ok(data)))
}

fn check_path_uuid(path: Uuid, body: Uuid) -> Result<(), ApiError> {
    if path != body {
        return Err(ApiError::new(
            StatusCode::BAD_REQUEST,
            format!("uuid in body ({}) does not match path ({})", body, path),
        ));
    }
    Ok(())
}

// ============================================================================
// ENTITY RESOURCES
// ============================================================================

/// Entity exposed as /api/<name>
pub trait Resource: Cached + Serialize + Send + Sync + 'static {
    fn delete(dao: &mut MoneyDao, uuid: Uuid) -> crate::Result<()>;
}

/// Resource stored whole from a JSON body
pub trait Upsert: Resource + DeserializeOwned {
    fn put(dao: &mut MoneyDao, record: Self) -> crate::Result<Self>;
}

macro_rules! simple_resource {
    ($($type:ty),*) => {
        $(
            impl Resource for $type {
                fn delete(dao: &mut MoneyDao, uuid: Uuid) -> crate::Result<()> {
                    dao.delete::<$type>(uuid)
                }
            }
        )*
    };
}

simple_resource!(Icon, Category, Currency, ExchangeSecurity, Card, Contact, MoneyDocument, PeriodicPayment);

macro_rules! simple_upsert {
    ($($type:ty),*) => {
        $(
            impl Upsert for $type {
                fn put(dao: &mut MoneyDao, record: Self) -> crate::Result<Self> {
                    dao.put(record)
                }
            }
        )*
    };
}

simple_upsert!(Category, Currency, ExchangeSecurity, Card, Contact, MoneyDocument, PeriodicPayment);

impl Upsert for Icon {
    /// Image bytes are not part of the JSON; an update without them keeps the stored image
    fn put(dao: &mut MoneyDao, mut record: Self) -> crate::Result<Self> {
        if record.bytes.is_empty() {
            if let Some(existing) = dao.get::<Icon>(record.uuid) {
                record.bytes = existing.bytes.clone();
            }
        }
        dao.put(record)
    }
}

impl Resource for Account {
    fn delete(dao: &mut MoneyDao, uuid: Uuid) -> crate::Result<()> {
        dao.delete_account(uuid)
    }
}

impl Upsert for Account {
    fn put(dao: &mut MoneyDao, record: Self) -> crate::Result<Self> {
        dao.put_account(record)
    }
}

impl Resource for Transaction {
    fn delete(dao: &mut MoneyDao, uuid: Uuid) -> crate::Result<()> {
        dao.delete_transaction(uuid)
    }
}

// ============================================================================
// API Handlers
// ============================================================================

/// GET /api/health - Health check
async fn health_check() -> impl IntoResponse {
    Json(ApiResponse::ok("OK"))
}

/// GET /api/<entity>
async fn list<T: Resource + Clone>(State(state): State<AppState>) -> ApiResult<Vec<T>> {
    let dao = state.lock()?;
    ok(dao.cache().all::<T>().to_vec())
}

/// GET /api/<entity>/:uuid
async fn get_one<T: Resource + Clone>(State(state): State<AppState>, Path(uuid): Path<Uuid>) -> ApiResult<T> {
    let dao = state.lock()?;
    let record = dao
        .get::<T>(uuid)
        .cloned()
        .ok_or_else(|| MoneyError::not_found(T::ENTITY, uuid))?;
    ok(record)
}

/// PUT /api/<entity>/:uuid - insert or replace
async fn put_one<T: Upsert>(
    State(state): State<AppState>,
    Path(uuid): Path<Uuid>,
    Json(record): Json<T>,
) -> ApiResult<T> {
    check_path_uuid(uuid, record.uuid())?;
    let mut dao = state.lock()?;
    ok(T::put(&mut dao, record)?)
}

/// DELETE /api/<entity>/:uuid
async fn delete_one<T: Resource>(State(state): State<AppState>, Path(uuid): Path<Uuid>) -> ApiResult<Uuid> {
    let mut dao = state.lock()?;
    T::delete(&mut dao, uuid)?;
    ok(uuid)
}

fn resource_routes<T: Upsert + Clone>() -> Router<AppState> {
    Router::new()
        .route("/", get(list::<T>))
        .route("/:uuid", get(get_one::<T>).put(put_one::<T>).delete(delete_one::<T>))
}

/// GET /api/icon/:uuid/bytes
async fn get_icon_bytes(State(state): State<AppState>, Path(uuid): Path<Uuid>) -> Result<Response, ApiError> {
    let dao = state.lock()?;
    let icon = dao
        .get::<Icon>(uuid)
        .filter(|icon| !icon.bytes.is_empty())
        .ok_or_else(|| MoneyError::not_found(Icon::ENTITY, uuid))?;
    Ok(([(header::CONTENT_TYPE, "image/png")], icon.bytes.clone()).into_response())
}

/// GET /api/document/:uuid/bytes
async fn get_document_bytes(State(state): State<AppState>, Path(uuid): Path<Uuid>) -> Result<Response, ApiError> {
    let dao = state.lock()?;
    let bytes = dao.document_bytes(uuid)?;
    let mime_type = dao
        .get::<MoneyDocument>(uuid)
        .map(|d| d.mime_type.clone())
        .filter(|m| !m.is_empty())
        .unwrap_or_else(|| "application/octet-stream".to_string());
    Ok(([(header::CONTENT_TYPE, mime_type)], bytes).into_response())
}

/// PUT /api/document/:uuid/bytes
async fn put_document_bytes(
    State(state): State<AppState>,
    Path(uuid): Path<Uuid>,
    body: Bytes,
) -> ApiResult<MoneyDocument> {
    let mut dao = state.lock()?;
    ok(dao.put_document_bytes(uuid, &body)?)
}

#[derive(Debug, Default, Deserialize)]
struct TransactionQuery {
    account: Option<Uuid>,
    category: Option<Uuid>,
    contact: Option<Uuid>,
    period: Option<String>,
    checked: Option<bool>,
}

impl TransactionQuery {
    fn to_filter(&self) -> Result<TransactionFilter, MoneyError> {
        let mut filter = TransactionFilter::new();
        if let Some(account) = self.account {
            filter = filter.with_account(account);
        }
        if let Some(category) = self.category {
            filter = filter.with_category(category);
        }
        if let Some(contact) = self.contact {
            filter = filter.with_contact(contact);
        }
        if let Some(ref period) = self.period {
            filter = filter.with_period(period.parse::<Period>()?);
        }
        if let Some(checked) = self.checked {
            filter = filter.with_checked(checked);
        }
        Ok(filter)
    }
}

/// GET /api/transaction?account=&category=&contact=&period=&checked=
async fn list_transactions(
    State(state): State<AppState>,
    Query(query): Query<TransactionQuery>,
) -> ApiResult<Vec<Transaction>> {
    let filter = query.to_filter()?;
    let today = chrono::Local::now().date_naive();
    let dao = state.lock()?;
    ok(dao
        .cache()
        .transactions_by_filter(&filter, today)
        .into_iter()
        .cloned()
        .collect())
}

/// PUT /api/transaction/:uuid - denormalised account fields may be omitted
async fn put_transaction(
    State(state): State<AppState>,
    Path(uuid): Path<Uuid>,
    Json(builder): Json<TransactionBuilder>,
) -> ApiResult<Transaction> {
    if let Some(body_uuid) = builder.get_uuid() {
        check_path_uuid(uuid, body_uuid)?;
    }
    let builder = builder.uuid(uuid);
    let mut dao = state.lock()?;

    let transaction = if dao.get::<Transaction>(uuid).is_some() {
        let transaction = {
            let cache = dao.cache();
            builder
                .resolve_accounts(|account| cache.get::<Account>(account).cloned())?
                .build()?
        };
        dao.update_transaction(transaction)?
    } else {
        dao.create_transaction(builder)?
    };
    ok(transaction)
}

/// GET /api/account/:uuid/transactions
async fn account_transactions(
    State(state): State<AppState>,
    Path(uuid): Path<Uuid>,
) -> ApiResult<Vec<Transaction>> {
    let dao = state.lock()?;
    if dao.get::<Account>(uuid).is_none() {
        return Err(MoneyError::not_found(Account::ENTITY, uuid).into());
    }
    ok(dao
        .cache()
        .transactions_for_account(uuid)
        .into_iter()
        .cloned()
        .collect())
}

#[derive(Debug, Default, Deserialize)]
struct StatementQuery {
    /// Account uuid, account number or card number
    account: Option<String>,
    ignore_execution_date: Option<bool>,
    #[serde(default)]
    check: bool,
    file_name: Option<String>,
}

/// POST /api/statement - body is the raw statement file
async fn post_statement(
    State(state): State<AppState>,
    Query(query): Query<StatementQuery>,
    body: Bytes,
) -> ApiResult<ReconciliationReport> {
    let data = RawStatementData::new(query.file_name.unwrap_or_else(|| "statement".to_string()), body.to_vec());
    let statement = parse_statement(&data)?;

    let base = &state.engine;
    let engine = ReconciliationEngine::with_thresholds(base.tolerance, base.major_discrepancy_threshold)
        .with_ignore_execution_date(query.ignore_execution_date.unwrap_or(base.ignore_execution_date));

    let mut dao = state.lock()?;
    let report = reconcile_statement(&mut dao, &engine, statement, query.account.as_deref(), query.check)?;
    ok(report)
}

/// GET /api/export - whole ledger as money.xml
async fn export(State(state): State<AppState>) -> Result<Response, ApiError> {
    let dump = state.lock()?.export_dump()?;
    let mut out = Vec::new();
    xml::write_xml(&dump, &mut out)?;
    info!("Exported {} records over HTTP", dump.record_count());
    Ok((
        [
            (header::CONTENT_TYPE, "application/xml"),
            (header::CONTENT_DISPOSITION, "attachment; filename=\"money.xml\""),
        ],
        out,
    )
        .into_response())
}

// ============================================================================
// ROUTER
// ============================================================================

fn api_routes() -> Router<AppState> {
    let transactions = Router::new()
        .route("/", get(list_transactions))
        .route(
            "/:uuid",
            get(get_one::<Transaction>)
                .put(put_transaction)
                .delete(delete_one::<Transaction>),
        );

    Router::new()
        .route("/health", get(health_check))
        .nest("/icon", resource_routes::<Icon>())
        .route("/icon/:uuid/bytes", get(get_icon_bytes))
        .nest("/category", resource_routes::<Category>())
        .nest("/currency", resource_routes::<Currency>())
        .nest("/security", resource_routes::<ExchangeSecurity>())
        .nest("/account", resource_routes::<Account>())
        .route("/account/:uuid/transactions", get(account_transactions))
        .nest("/card", resource_routes::<Card>())
        .nest("/contact", resource_routes::<Contact>())
        .nest("/transaction", transactions)
        .nest("/document", resource_routes::<MoneyDocument>())
        .route("/document/:uuid/bytes", get(get_document_bytes).put(put_document_bytes))
        .nest("/periodic-payment", resource_routes::<PeriodicPayment>())
        .route("/statement", axum::routing::post(post_statement))
        .route("/export", get(export))
}

/// Complete application router
pub fn router(state: AppState) -> Router {
    Router::new()
        .nest("/api", api_routes())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
