use anyhow::Result;
use clap::Args;
use colored::Colorize;
use outliner::{
    ConnectionState, DocumentProvider, EditSession, ProviderError, RemoteDocProvider,
    SessionOptions,
};
use std::sync::Arc;

#[derive(Debug, Args)]
pub struct RemoteArgs {
    /// Document id
    pub id: String,

    /// Collaboration server URL
    #[arg(short, long)]
    pub endpoint: Option<String>,
}

/// Try to open a collaborative session. The transport does not exist yet, so
/// this reports the connection failure.
pub async fn remote(args: RemoteArgs) -> Result<()> {
    let mut provider: RemoteDocProvider = RemoteDocProvider::new(args.id);
    if let Some(endpoint) = args.endpoint {
        provider = provider.with_endpoint(endpoint);
    }
    let provider = Arc::new(provider);

    let (result, state) = connect_once(provider.clone()).await;
    result?;

    if state.is_connected() {
        println!("  {} Connected to {}", "✓".green(), provider.id());
    } else {
        println!("  {} {} is {}", "✗".red(), provider.id(), state);
    }
    Ok(())
}

/// Bind, connect and unbind, reporting the state the session saw before
/// unbinding
async fn connect_once(
    provider: Arc<RemoteDocProvider>,
) -> (Result<(), ProviderError>, ConnectionState) {
    let mut session = EditSession::bind(provider.clone(), SessionOptions::default());
    let result = session.connect().await;
    let state = session.connection_state();
    session.unbind().await;

    if let Err(e) = &result {
        println!("  {} {} is {}: {}", "✗".red(), provider.id(), state, e);
    }
    (result, state)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_connect_once_fails_and_stays_disconnected() {
        let provider: Arc<RemoteDocProvider> =
            Arc::new(RemoteDocProvider::new("collab").with_endpoint("wss://example.test"));

        let (result, state) = connect_once(provider.clone()).await;

        assert!(matches!(result, Err(ProviderError::TransportUnavailable(_))));
        assert_eq!(state, ConnectionState::Disconnected);
        assert!(!state.is_connected());
        assert_eq!(provider.get_connection_state(), ConnectionState::Disconnected);
    }

    #[tokio::test]
    async fn test_remote_command_reports_error() {
        let args = RemoteArgs {
            id: "collab".to_string(),
            endpoint: None,
        };

        let err = remote(args).await.unwrap_err();
        assert!(err.to_string().contains("not implemented"));
    }
}
