use lambda_runtime::Context;

/// Lambda invocation details attached to each request synthesized by the adapter.
///
/// Handlers running behind the adapter can read it from the request extensions;
/// requests served directly over HTTP carry none.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct InvocationContext {
    pub request_id: String,
    pub function_name: String,
    pub function_version: String,
    pub invoked_function_arn: String,
    pub xray_trace_id: Option<String>,
    /// Invocation deadline in milliseconds since the Unix epoch.
    pub deadline_ms: u64,
}

impl From<&Context> for InvocationContext {
    fn from(context: &Context) -> Self {
        Self {
            request_id: context.request_id.clone(),
            function_name: context.env_config.function_name.clone(),
            function_version: context.env_config.version.clone(),
            invoked_function_arn: context.invoked_function_arn.clone(),
            xray_trace_id: context.xray_trace_id.clone(),
            deadline_ms: context.deadline,
        }
    }
}
