//! The remote identity-verification endpoint, used only in online mode
//! (spec.md §6.4).

use serde::Deserialize;
use uuid::Uuid;

use crate::error::{Result, ServerError};
use crate::player::SkinProperty;

#[derive(Debug, Deserialize)]
struct HasJoinedResponse {
    id: Uuid,
    #[allow(dead_code)]
    name: String,
    #[serde(default)]
    properties: Vec<RawProperty>,
}

#[derive(Debug, Deserialize)]
struct RawProperty {
    name: String,
    value: String,
    signature: Option<String>,
}

/// The verified identity handed back by Mojang's session server.
pub struct Identity {
    pub uuid: Uuid,
    pub properties: Vec<SkinProperty>,
}

/// `GET https://sessionserver.mojang.com/session/minecraft/hasJoined` (spec.md
/// §6.4). HTTP 204/403 are authentication failures, not transport errors;
/// any other non-200 status is a hard error.
pub fn has_joined(client: &reqwest::blocking::Client, username: &str, session_hash: &str) -> Result<Identity> {
    let url = "https://sessionserver.mojang.com/session/minecraft/hasJoined";
    let response = client
        .get(url)
        .query(&[("username", username), ("serverId", session_hash)])
        .send()
        .map_err(|e| ServerError::AuthFailed(format!("identity endpoint request failed: {e}")))?;

    match response.status().as_u16() {
        200 => {
            let parsed: HasJoinedResponse = response
                .json()
                .map_err(|e| ServerError::AuthFailed(format!("malformed identity response: {e}")))?;
            Ok(Identity {
                uuid: parsed.id,
                properties: parsed
                    .properties
                    .into_iter()
                    .map(|p| SkinProperty {
                        name: p.name,
                        value: p.value,
                        signature: p.signature,
                    })
                    .collect(),
            })
        }
        204 | 403 => Err(ServerError::AuthFailed(
            "session server rejected the client".to_string(),
        )),
        other => Err(ServerError::AuthFailed(format!(
            "unexpected identity endpoint status {other}"
        ))),
    }
}
