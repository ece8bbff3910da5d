//! Query type detection.

use super::{gateway::CompletionGateway, salvage, DetectionResult, QueryCategory};

// Braces below belong to the JSON example the model is shown, which is why
// this is a plain const and not a format string.
const DETECTION_INSTRUCTION: &str = r#"你是一个智能的查询分析专家。请分析用户的查询，识别其属于以下哪种类型：
1. 上下文依赖型 - 包含"还有"、"其他"等需要上下文理解的词汇
2. 对比型 - 包含"哪个"、"比较"、"更"、"哪个更好"、"哪个更"等比较词汇
3. 模糊指代型 - 包含"它"、"他们"、"都"、"这个"等指代词
4. 多意图型 - 包含多个独立问题，用"、"或"？"分隔
5. 反问型 - 包含"不会"、"难道"等反问语气
6. 普通型 - 不属于以上任何一种的常规问题。

说明：如果同时存在多意图型、模糊指代型，优先级为多意图型>模糊指代型。请返回最符合的一种类型。

请严格按照以下JSON格式返回结果，不要包含任何其他解释：
{
    "query_type": "识别出的查询类型",
    "confidence": 0.8
}"#;

/// Classifies a query into one of the six categories with a single
/// completion call. Detection never fails: unusable model output yields the
/// `Plain`/0.5 default.
pub struct QueryTypeDetector {
    gateway: CompletionGateway,
}

impl QueryTypeDetector {
    pub fn new(gateway: CompletionGateway) -> Self {
        Self { gateway }
    }

    pub async fn detect(&self, query: &str, history: &str, context: &str) -> DetectionResult {
        let prompt = format!(
            "### 指令 ###\n{DETECTION_INSTRUCTION}\n\n\
             ### 对话历史 ###\n{history}\n\n\
             ### 上下文信息 ###\n{context}\n\n\
             ### 原始查询 ###\n{query}\n\n\
             ### 分析结果 (JSON) ###\n"
        );

        let completion = self.gateway.complete(&prompt).await;

        let Some(value) = salvage::salvage_json_object(&completion) else {
            tracing::warn!(raw = %completion, "Unparseable type detection response, defaulting to plain");
            return DetectionResult::fallback();
        };

        let Some(label) = value.get("query_type").and_then(|v| v.as_str()) else {
            tracing::warn!(raw = %completion, "Type detection response missing query_type, defaulting to plain");
            return DetectionResult::fallback();
        };

        let confidence = value
            .get("confidence")
            .and_then(|v| v.as_f64())
            .map(|c| c.clamp(0.0, 1.0) as f32)
            .unwrap_or(0.5);

        let category = QueryCategory::from_label(label);
        tracing::debug!(label = %label, category = ?category, confidence, "Query type detected");

        DetectionResult {
            category,
            label: label.to_string(),
            confidence,
        }
    }
}
