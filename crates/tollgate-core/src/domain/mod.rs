//! Domain model (errors, requests, ids, drafts, chunk rules, assets).
//!
//! ここには I/O を持たない型と純粋関数だけを置きます。
//! 外部とのやり取りは ports、組み立ては app の責務です。

pub mod asset;
pub mod chunk;
pub mod draft;
pub mod errors;
pub mod ids;
pub mod request;

pub use self::asset::{Asset, AssetType, PerfSummary, RankedAsset, TypeSummary, TypeTotals};
pub use self::chunk::{CATCH_ALL_CHUNK, ChunkRule, VENDOR_ROOT, default_rules};
pub use self::draft::DraftKey;
pub use self::errors::{
    DraftError, ErrorCategory, GatewayError, ReportError, RequestFailure, StoreError, classify,
};
pub use self::ids::RequestId;
pub use self::request::{
    ApiRequest, FormPart, Method, RequestBody, RequestOptions, TransportFailure,
    TransportResponse,
};
