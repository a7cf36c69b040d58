//! AWS STS issuer.

use super::{AssumeRoleRequest, Caller, CredentialIssuer};
use crate::context::Context;
use crate::credentials::CredentialSet;
use crate::{sdk, LetmeError, Result};
use async_trait::async_trait;
use aws_config::SdkConfig;
use aws_sdk_sts::error::{DisplayErrorContext, ProvideErrorMetadata};
use aws_sdk_sts::Client;
use std::time::SystemTime;
use tracing::{debug, info};

/// Provider name attached to the static credentials of intermediate hops.
const CHAIN_PROVIDER: &str = "letme-chain";

/// Issues credentials through `sts:AssumeRole`.
pub struct StsIssuer {
    config: SdkConfig,
}

impl StsIssuer {
    pub fn new(config: SdkConfig) -> Self {
        Self { config }
    }

    /// Issuer authorized by the context's source profile and region.
    pub async fn for_context(context: &Context) -> Self {
        let config = sdk::load_config(
            Some(&context.source_profile),
            context.source_region.as_deref(),
            None,
        )
        .await;
        Self::new(config)
    }

    fn client(&self, caller: Caller<'_>) -> Client {
        match caller {
            Caller::Source => Client::new(&self.config),
            Caller::Session(creds) => {
                let provided = aws_sdk_sts::config::Credentials::new(
                    creds.access_key_id.clone(),
                    creds.secret_access_key.clone(),
                    Some(creds.session_token.clone()),
                    Some(SystemTime::from(creds.expiration)),
                    CHAIN_PROVIDER,
                );
                let conf = aws_sdk_sts::config::Builder::from(&self.config)
                    .credentials_provider(provided)
                    .build();
                Client::from_conf(conf)
            }
        }
    }
}

#[async_trait]
impl CredentialIssuer for StsIssuer {
    fn name(&self) -> &str {
        "sts"
    }

    async fn assume_role(
        &self,
        caller: Caller<'_>,
        request: &AssumeRoleRequest,
    ) -> Result<CredentialSet> {
        info!("Calling AWS STS AssumeRole");
        debug!("Role ARN: {}", request.role_arn);
        debug!("Session name: {}", request.session_name);
        debug!("Duration: {} seconds", request.duration_seconds);

        let duration = i32::try_from(request.duration_seconds).map_err(|_| {
            LetmeError::Configuration(format!(
                "session duration {} is out of range",
                request.duration_seconds
            ))
        })?;

        let mut call = self
            .client(caller)
            .assume_role()
            .role_arn(&request.role_arn)
            .role_session_name(&request.session_name)
            .duration_seconds(duration);

        if let Some(mfa) = &request.mfa {
            debug!("MFA device: {}", mfa.serial_number);
            call = call
                .serial_number(&mfa.serial_number)
                .token_code(&mfa.token_code);
        }

        let response = call.send().await.map_err(|e| {
            classify(e.code(), &DisplayErrorContext(&e).to_string())
        })?;

        let sts_creds = response
            .credentials()
            .ok_or_else(|| LetmeError::Upstream("AWS STS returned no credentials".to_string()))?;

        let exp = sts_creds.expiration();
        let expiration = chrono::DateTime::from_timestamp(exp.secs(), exp.subsec_nanos())
            .ok_or_else(|| {
                LetmeError::Upstream(format!("AWS STS returned an invalid expiration: {exp:?}"))
            })?;

        Ok(CredentialSet::new(
            sts_creds.access_key_id(),
            sts_creds.secret_access_key(),
            sts_creds.session_token(),
            expiration,
        ))
    }
}

/// Maps an STS failure onto the error taxonomy.
fn classify(code: Option<&str>, message: &str) -> LetmeError {
    match code {
        Some(
            "ExpiredToken"
            | "ExpiredTokenException"
            | "InvalidClientTokenId"
            | "SignatureDoesNotMatch"
            | "UnrecognizedClientException",
        ) => LetmeError::Authentication(message.to_string()),
        Some("AccessDenied") if message.contains("MultiFactorAuthentication") => {
            LetmeError::Authentication(message.to_string())
        }
        _ => LetmeError::Upstream(message.to_string()),
    }
}
