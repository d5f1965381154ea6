pub mod fetcher;
pub mod llm;
pub mod reducer;

#[cfg(test)]
mod test_server;

use prodex_core::{AppError, ExtractionPipeline, PipelineConfig, PromptBuilder};

pub use fetcher::ReqwestFetcher;
pub use llm::OpenAiClient;
pub use reducer::HtmlReducer;

/// The pipeline wired with the network-backed collaborators.
pub type HttpPipeline = ExtractionPipeline<ReqwestFetcher, HtmlReducer, OpenAiClient>;

/// Build the production pipeline from configuration.
pub fn build_pipeline(config: &PipelineConfig) -> Result<HttpPipeline, AppError> {
    let fetcher = ReqwestFetcher::with_timeout(config.fetch_timeout)?
        .block_private_urls(config.block_private_urls)?;
    let client =
        OpenAiClient::with_base_url(&config.model, &config.base_url)?.with_timeout(config.llm_timeout)?;
    let template = config.load_template()?;

    tracing::debug!(
        model = %config.model,
        base_url = %config.base_url,
        template = template.name(),
        "Pipeline configured"
    );

    Ok(ExtractionPipeline::new(fetcher, HtmlReducer::new(), client)
        .with_prompt_builder(PromptBuilder::new(template))
        .with_fetch_policy(config.fetch_policy())
        .with_completion_policy(config.completion_policy())
        .with_reduction_failure_policy(config.on_reduction_failure)
        .normalize_output(config.normalize_output))
}
