//! ApiEndpoints - バックエンドのエンドポイント表
//!
//! payload は業務側の JSON をそのまま渡します（ここでは解釈しない）。

use std::sync::Arc;

use serde_json::Value;

use crate::app::gateway::RequestGateway;
use crate::domain::{FormPart, GatewayError};

pub const HEALTH: &str = "/health";
pub const REVIEW_REQUIREMENTS: &str = "/review-requirements";
pub const PRICE_REFERENCE: &str = "/price-reference";
pub const PRICE_ANALYZE: &str = "/price-reference/analyze";
pub const CONTRACT_ANALYSIS: &str = "/contract-analysis";
pub const CHAT_CONVERSATION: &str = "/chat/conversation";
pub const CHAT_PROCUREMENT: &str = "/chat/procurement-analysis";
pub const CHAT_PRICE_RECOMMENDATION: &str = "/chat/price-recommendation";

#[derive(Clone)]
pub struct ApiEndpoints {
    gateway: Arc<RequestGateway>,
}

impl ApiEndpoints {
    pub fn new(gateway: Arc<RequestGateway>) -> Self {
        Self { gateway }
    }

    pub fn gateway(&self) -> &RequestGateway {
        &self.gateway
    }

    pub async fn health(&self) -> Result<Value, GatewayError> {
        self.gateway.get(HEALTH, None).await
    }

    pub async fn review_requirements(&self, form: Vec<FormPart>) -> Result<Value, GatewayError> {
        self.gateway.upload(REVIEW_REQUIREMENTS, form).await
    }

    /// `params` fields become query parameters; nulls are dropped.
    pub async fn price_reference(&self, params: Option<&Value>) -> Result<Value, GatewayError> {
        self.gateway.get(PRICE_REFERENCE, params).await
    }

    pub async fn analyze_price(&self, data: Value) -> Result<Value, GatewayError> {
        self.gateway.post(PRICE_ANALYZE, data).await
    }

    pub async fn analyze_contract(&self, form: Vec<FormPart>) -> Result<Value, GatewayError> {
        self.gateway.upload(CONTRACT_ANALYSIS, form).await
    }

    pub async fn chat(&self, data: Value) -> Result<Value, GatewayError> {
        self.gateway.post(CHAT_CONVERSATION, data).await
    }

    pub async fn procurement_analysis(&self, data: Value) -> Result<Value, GatewayError> {
        self.gateway.post(CHAT_PROCUREMENT, data).await
    }

    pub async fn price_recommendation(&self, data: Value) -> Result<Value, GatewayError> {
        self.gateway.post(CHAT_PRICE_RECOMMENDATION, data).await
    }
}
