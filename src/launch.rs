//! Game-launch URL construction.
//!
//! Builds the provider-hosted URL a player is redirected to. Real-money
//! mode attaches a session token and the balance cached on the session at
//! launch time; demo mode never carries either.

use crate::config::ProviderConfig;
use crate::errors::BridgeResult;
use crate::sessions::SessionService;
use std::sync::Arc;
use tracing::debug;

/// Play mode requested by the lobby.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LaunchMode {
    Real,
    Demo,
}

/// Everything the lobby knows about the launch.
#[derive(Clone, Debug)]
pub struct LaunchRequest {
    pub player_id: String,
    pub game_code: String,
    pub mode: LaunchMode,
    pub return_url: String,
    pub language: String,
    pub currency: String,
    pub platform: String,
}

/// Builds provider launch URLs, creating or reusing a provider session for
/// real-money play.
pub struct LaunchUrlBuilder {
    base_url: String,
    sessions: Arc<SessionService>,
}

impl LaunchUrlBuilder {
    pub fn new(provider: &ProviderConfig, sessions: Arc<SessionService>) -> Self {
        Self {
            base_url: provider.launch_base_url.trim_end_matches('/').to_string(),
            sessions,
        }
    }

    pub async fn build(&self, request: &LaunchRequest) -> BridgeResult<String> {
        let mut url = format!(
            "{}/play?gameSymbol={}&lang={}&cur={}&lobbyUrl={}&platform={}",
            self.base_url,
            encode(&request.game_code),
            encode(&request.language),
            encode(&request.currency),
            encode(&request.return_url),
            encode(&request.platform),
        );

        match request.mode {
            LaunchMode::Demo => {
                url.push_str("&playMode=demo");
            }
            LaunchMode::Real => {
                let session = match self
                    .sessions
                    .get_session_by_player_and_game(&request.player_id, Some(&request.game_code))
                    .await
                {
                    Some(session) => session,
                    None => {
                        self.sessions
                            .create_session(
                                &request.player_id,
                                Some(&request.game_code),
                                &request.currency,
                            )
                            .await?
                    }
                };
                url.push_str("&playMode=real&token=");
                url.push_str(&encode(&session.token));
                if let Some(balance) = session.balance {
                    url.push_str(&format!("&balance={}", balance));
                }
            }
        }

        debug!(player_id = %request.player_id, game_code = %request.game_code, "launch URL built");
        Ok(url)
    }
}

/// Percent-encode a query-string value (RFC 3986 unreserved set passes
/// through).
fn encode(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for byte in value.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                out.push(byte as char)
            }
            _ => out.push_str(&format!("%{:02X}", byte)),
        }
    }
    out
}
