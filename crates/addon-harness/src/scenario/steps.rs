use serde::Serialize;
use serde_json::Value;
use tracing::debug;

use crate::infra::AiProvider;
use crate::scenario::client::ServiceClient;
use crate::scenario::context::ScenarioContext;
use crate::scenario::error::ScenarioError;
use crate::scenario::expect;

pub const KNOWN_TERM: &str = "matrix";
pub const UNMATCHED_TERM: &str = "zqxv unmatched e2e title";
pub const META_ID: &str = "tt0133093";
const CATALOG_TYPE: &str = "movie";
const CATALOG_ID: &str = "aisearch.top";

const MOCK_TMDB_KEY: &str = "mock";
const MOCK_GEMINI_KEY: &str = "mock-gemini-key";
const MOCK_GEMINI_MODEL: &str = "gemini-2.0-flash";
const MOCK_OPENAI_COMPAT_KEY: &str = "mock-openai-key";
const MOCK_OPENAI_COMPAT_MODEL: &str = "mock-model";
const MALFORMED_EXTRA_HEADERS: &str = "{not valid json";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    ValidateConfig,
    EncryptConfig,
    SearchKnown,
    SearchUnmatched,
    SimilarMeta,
}

impl Step {
    /// Execution order. Every step after `EncryptConfig` needs its config id.
    pub const ALL: [Step; 5] = [
        Step::ValidateConfig,
        Step::EncryptConfig,
        Step::SearchKnown,
        Step::SearchUnmatched,
        Step::SimilarMeta,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Step::ValidateConfig => "validate-config",
            Step::EncryptConfig => "encrypt-config",
            Step::SearchKnown => "search-known",
            Step::SearchUnmatched => "search-unmatched",
            Step::SimilarMeta => "similar-meta",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            Step::ValidateConfig => {
                "validation rejects malformed extra headers and accepts mock credentials"
            }
            Step::EncryptConfig => "encryption returns an opaque configuration id",
            Step::SearchKnown => "a known title search returns metas with ids",
            Step::SearchUnmatched => "an unmatched search still returns metas",
            Step::SimilarMeta => "the meta endpoint returns similar videos",
        }
    }

    pub async fn run(
        self,
        client: &ServiceClient,
        context: ScenarioContext,
    ) -> Result<ScenarioContext, ScenarioError> {
        match self {
            Step::ValidateConfig => validate_config(self.name(), client, context).await,
            Step::EncryptConfig => encrypt_config(self.name(), client, context).await,
            Step::SearchKnown => search(self.name(), client, context, KNOWN_TERM, true).await,
            Step::SearchUnmatched => {
                search(self.name(), client, context, UNMATCHED_TERM, false).await
            }
            Step::SimilarMeta => similar_meta(self.name(), client, context).await,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Credentials {
    #[serde(rename = "TmdbApiKey")]
    pub tmdb_api_key: String,
    #[serde(rename = "AiProvider")]
    pub ai_provider: &'static str,
    #[serde(rename = "GeminiApiKey", skip_serializing_if = "Option::is_none")]
    pub gemini_api_key: Option<String>,
    #[serde(rename = "GeminiModel", skip_serializing_if = "Option::is_none")]
    pub gemini_model: Option<String>,
    #[serde(rename = "OpenAICompatApiKey", skip_serializing_if = "Option::is_none")]
    pub openai_compat_api_key: Option<String>,
    #[serde(rename = "OpenAICompatModel", skip_serializing_if = "Option::is_none")]
    pub openai_compat_model: Option<String>,
    #[serde(rename = "OpenAICompatApiUrl", skip_serializing_if = "Option::is_none")]
    pub openai_compat_api_url: Option<String>,
    #[serde(
        rename = "OpenAICompatExtraHeaders",
        skip_serializing_if = "Option::is_none"
    )]
    pub openai_compat_extra_headers: Option<String>,
}

impl Credentials {
    fn openai_compat(context: &ScenarioContext) -> Self {
        Self {
            tmdb_api_key: MOCK_TMDB_KEY.to_string(),
            ai_provider: AiProvider::OpenaiCompat.as_str(),
            gemini_api_key: None,
            gemini_model: None,
            openai_compat_api_key: Some(MOCK_OPENAI_COMPAT_KEY.to_string()),
            openai_compat_model: Some(MOCK_OPENAI_COMPAT_MODEL.to_string()),
            openai_compat_api_url: Some(context.openai_compat_base_url()),
            openai_compat_extra_headers: None,
        }
    }

    /// Credentials for the selected profile. The gemini profile keeps the
    /// openai-compat fields so the service can fall back to the fixture.
    pub fn for_profile(context: &ScenarioContext) -> Self {
        let credentials = Self::openai_compat(context);
        match context.ai_provider {
            AiProvider::OpenaiCompat => credentials,
            AiProvider::Gemini => Self {
                ai_provider: AiProvider::Gemini.as_str(),
                gemini_api_key: Some(MOCK_GEMINI_KEY.to_string()),
                gemini_model: Some(MOCK_GEMINI_MODEL.to_string()),
                ..credentials
            },
        }
    }

    pub fn malformed_extra_headers(context: &ScenarioContext) -> Self {
        Self {
            openai_compat_extra_headers: Some(MALFORMED_EXTRA_HEADERS.to_string()),
            ..Self::openai_compat(context)
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct EncryptRequest {
    #[serde(flatten)]
    pub credentials: Credentials,
    #[serde(rename = "NumResults")]
    pub num_results: u32,
    #[serde(rename = "EnableAiCache")]
    pub enable_ai_cache: bool,
    #[serde(rename = "EnableRpdb")]
    pub enable_rpdb: bool,
    #[serde(rename = "IncludeAdult")]
    pub include_adult: bool,
    #[serde(rename = "EnableHomepage")]
    pub enable_homepage: bool,
}

impl EncryptRequest {
    pub fn new(credentials: Credentials) -> Self {
        Self {
            credentials,
            num_results: 10,
            enable_ai_cache: false,
            enable_rpdb: false,
            include_adult: false,
            enable_homepage: true,
        }
    }
}

async fn validate_config(
    step: &'static str,
    client: &ServiceClient,
    context: ScenarioContext,
) -> Result<ScenarioContext, ScenarioError> {
    let malformed = Credentials::malformed_extra_headers(&context);
    let body = client
        .post_json(step, &["validate"], &malformed)
        .await?
        .json(step)?;
    let accepted = expect::bool_field(step, &body, "openaiCompat")?;
    expect::ensure(
        step,
        !accepted,
        "`openaiCompat` to be false for malformed extra headers",
        &body,
    )?;
    expect::non_empty_str(step, &body, "errors.openaiCompat")?;

    let body = client
        .post_json(step, &["validate"], &Credentials::for_profile(&context))
        .await?
        .json(step)?;
    let tmdb = expect::bool_field(step, &body, "tmdb")?;
    expect::ensure(step, tmdb, "`tmdb` to be true for the mock key", &body)?;
    let flag = |path: &str| expect::field(&body, path).and_then(Value::as_bool) == Some(true);
    expect::ensure(
        step,
        flag("gemini") || flag("openaiCompat"),
        "`gemini` or `openaiCompat` to be true",
        &body,
    )?;
    Ok(context)
}

async fn encrypt_config(
    step: &'static str,
    client: &ServiceClient,
    context: ScenarioContext,
) -> Result<ScenarioContext, ScenarioError> {
    let request = EncryptRequest::new(Credentials::for_profile(&context));
    let body = client
        .post_json(step, &["encrypt"], &request)
        .await?
        .json(step)?;
    let config_id = expect::non_empty_str(step, &body, "encryptedConfig")?.to_string();
    debug!(step, length = config_id.len(), "Received configuration id");
    Ok(context.with_config_id(config_id))
}

async fn search(
    step: &'static str,
    client: &ServiceClient,
    context: ScenarioContext,
    term: &str,
    require_ids: bool,
) -> Result<ScenarioContext, ScenarioError> {
    let config_id = context.require_config_id(step)?;
    let last = format!("search={term}.json");
    let segments = [
        "aisearch",
        config_id,
        "catalog",
        CATALOG_TYPE,
        CATALOG_ID,
        last.as_str(),
    ];
    let body = client.get(step, &segments).await?.json(step)?;
    let metas = expect::non_empty_array(step, &body, "metas")?;
    if require_ids {
        for meta in metas {
            expect::ensure(step, meta.is_object(), "every meta to be an object", meta)?;
            expect::non_empty_str(step, meta, "id")?;
        }
    }
    Ok(context)
}

async fn similar_meta(
    step: &'static str,
    client: &ServiceClient,
    context: ScenarioContext,
) -> Result<ScenarioContext, ScenarioError> {
    let config_id = context.require_config_id(step)?;
    let last = format!("{META_ID}.json");
    let segments = ["aisearch", config_id, "meta", CATALOG_TYPE, last.as_str()];
    let body = client.get(step, &segments).await?.json(step)?;
    let meta = expect::field(&body, "meta").unwrap_or(&Value::Null);
    expect::ensure(step, meta.is_object(), "`meta` to be an object", &body)?;
    expect::non_empty_array(step, &body, "meta.videos")?;
    Ok(context)
}
