use crate::info::EnvSnapshot;

const RUNTIME_API_ENV: &str = "AWS_LAMBDA_RUNTIME_API";

/// Describes where the process is executing.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum RuntimePlatform {
    /// Running inside AWS Lambda; requests arrive as invocation events.
    Lambda(LambdaPlatform),
    /// Running as a plain HTTP server.
    #[default]
    Standalone,
}

impl RuntimePlatform {
    /// Infers the platform from the variables the Lambda execution environment injects.
    pub fn detect(env: &EnvSnapshot) -> Self {
        match LambdaPlatform::from_snapshot(env) {
            Some(platform) => Self::Lambda(platform),
            None => Self::Standalone,
        }
    }

    /// Returns the Lambda platform details when active.
    pub fn as_lambda(&self) -> Option<&LambdaPlatform> {
        match self {
            RuntimePlatform::Lambda(platform) => Some(platform),
            RuntimePlatform::Standalone => None,
        }
    }

    pub fn is_lambda(&self) -> bool {
        matches!(self, RuntimePlatform::Lambda(_))
    }
}

/// Lambda function details gleaned from the execution environment.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LambdaPlatform {
    pub runtime_api: String,
    pub function_name: Option<String>,
    pub function_version: Option<String>,
    pub memory_size_mb: Option<u32>,
}

impl LambdaPlatform {
    fn from_snapshot(env: &EnvSnapshot) -> Option<Self> {
        let runtime_api = env.get(RUNTIME_API_ENV)?.to_owned();

        Some(Self {
            runtime_api,
            function_name: env.get("AWS_LAMBDA_FUNCTION_NAME").map(str::to_owned),
            function_version: env.get("AWS_LAMBDA_FUNCTION_VERSION").map(str::to_owned),
            memory_size_mb: env
                .get("AWS_LAMBDA_FUNCTION_MEMORY_SIZE")
                .and_then(|value| value.parse().ok()),
        })
    }
}
