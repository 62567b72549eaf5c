use axum::{
    Json,
    extract::{Query, State},
    http::StatusCode,
};
use serde_json::Map;

use dbk_api_types::{
    ErrorResponse, PreparedTokenResponse, TokenBurnRequest, TokenListResponse, TokenUpdateRequest,
};
use dbk_chain_client::ChainError;
use dbk_token::script::{USR_LABEL, unit};
use dbk_token::{Token, TokenError, plan_burn, plan_update};
use dbk_wallet::WalletConnection;

use crate::documents::OwnerQuery;
use crate::dto::{token_to_dto, utxo_from_dto};
use crate::{ApiResult, AppState, bad_request, epoch_ms, internal_error};

pub(crate) fn token_error(err: &TokenError) -> (StatusCode, Json<ErrorResponse>) {
    match err {
        TokenError::NameRequired
        | TokenError::NameTooLong
        | TokenError::NameInvalid
        | TokenError::ImageRequired
        | TokenError::ImageTooLong { .. }
        | TokenError::EmptyWallet
        | TokenError::MissingUserToken
        | TokenError::MalformedTxHash(_) => bad_request(err),
        TokenError::Chain(chain_err) => match chain_err {
            ChainError::NotConnected
            | ChainError::WalletDisconnected
            | ChainError::Validation { .. } => bad_request(err),
            _ => internal_error(err),
        },
    }
}

pub(crate) async fn list_tokens(
    State(state): State<AppState>,
    Query(query): Query<OwnerQuery>,
) -> ApiResult<TokenListResponse> {
    if query.owner_address.trim().is_empty() {
        return Err(bad_request("owner_address is required"));
    }

    let connection = WalletConnection {
        chain: Some(state.chain.clone()),
        address: query.owner_address.clone(),
        ..WalletConnection::default()
    };

    let tokens = dbk_token::list_tokens(&connection, &state.script)
        .await
        .map_err(|err| token_error(&err))?;

    Ok(Json(TokenListResponse {
        tokens: tokens.iter().map(token_to_dto).collect(),
    }))
}

fn token_from_request(
    name: String,
    image: String,
    asset_name: String,
    utxo: dbk_api_types::UtxoDto,
) -> Result<Token, (StatusCode, Json<ErrorResponse>)> {
    let utxo = utxo_from_dto(utxo).map_err(|err| bad_request(format!("malformed utxo: {err}")))?;
    Ok(Token {
        name,
        image,
        utxo,
        asset_name,
        metadata: Map::new(),
    })
}

async fn user_unit_inputs(
    state: &AppState,
    owner_address: &str,
    asset_name: &str,
) -> Result<Vec<dbk_chain_client::Utxo>, (StatusCode, Json<ErrorResponse>)> {
    let usr_unit = unit(&state.script.policy_id, USR_LABEL, asset_name);
    state
        .chain
        .utxos_at_with_unit(owner_address, &usr_unit)
        .await
        .map_err(internal_error)
}

pub(crate) async fn prepare_update(
    State(state): State<AppState>,
    Json(request): Json<TokenUpdateRequest>,
) -> ApiResult<PreparedTokenResponse> {
    if request.owner_address.trim().is_empty() {
        return Err(bad_request("owner_address is required"));
    }

    let token = token_from_request(request.name, request.image, request.asset_name, request.utxo)?;
    let inputs = user_unit_inputs(&state, &request.owner_address, &token.asset_name).await?;

    let prepared = plan_update(&token, &inputs, &state.script, epoch_ms())
        .map_err(|err| token_error(&err))?;
    let unsigned = state
        .builder
        .build(&prepared.plan)
        .await
        .map_err(internal_error)?;

    Ok(Json(PreparedTokenResponse {
        token: token_to_dto(&prepared.token),
        unsigned_tx: unsigned.tx,
    }))
}

pub(crate) async fn prepare_burn(
    State(state): State<AppState>,
    Json(request): Json<TokenBurnRequest>,
) -> ApiResult<PreparedTokenResponse> {
    if request.owner_address.trim().is_empty() {
        return Err(bad_request("owner_address is required"));
    }

    let token = token_from_request(request.name, request.image, request.asset_name, request.utxo)?;
    let inputs = user_unit_inputs(&state, &request.owner_address, &token.asset_name).await?;

    let prepared =
        plan_burn(&token, &inputs, &state.script, epoch_ms()).map_err(|err| token_error(&err))?;
    let unsigned = state
        .builder
        .build(&prepared.plan)
        .await
        .map_err(internal_error)?;

    Ok(Json(PreparedTokenResponse {
        token: token_to_dto(&prepared.token),
        unsigned_tx: unsigned.tx,
    }))
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    use dbk_chain_client::Utxo;

    use crate::documents::tests_support::{MockChain, script, state_with};
    use crate::router;

    fn token_request_body(utxo_address: &str) -> String {
        let asset_name = "cd".repeat(28);
        serde_json::json!({
            "owner_address": "addr_test1owner",
            "name": "Report_2024",
            "image": "https://gw.example/ipfs/QmFile",
            "asset_name": asset_name,
            "utxo": {
                "tx_hash": "22".repeat(32),
                "output_index": 0,
                "address": utxo_address,
                "assets": {},
            }
        })
        .to_string()
    }

    fn chain_with_user_unit() -> MockChain {
        let asset_name = "cd".repeat(28);
        let usr_unit = format!("{}{}{}", script().policy_id, "000de140", asset_name);
        MockChain {
            utxos: vec![Utxo {
                tx_hash: "33".repeat(32),
                output_index: 1,
                address: "addr_test1owner".to_owned(),
                assets: BTreeMap::from([(usr_unit, 1)]),
                datum: None,
            }],
            ..MockChain::default()
        }
    }

    async fn post(state: crate::AppState, path: &str, body: String) -> (StatusCode, serde_json::Value) {
        let app = router(state);
        let response = app
            .oneshot(
                Request::post(path)
                    .header("content-type", "application/json")
                    .body(Body::from(body))
                    .unwrap(),
            )
            .await
            .unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), 1024 * 1024)
            .await
            .unwrap();
        let value = serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null);
        (status, value)
    }

    #[tokio::test]
    async fn burn_projects_the_sentinel_pointer() {
        let (status, body) = post(
            state_with(chain_with_user_unit()),
            "/tokens/burn",
            token_request_body("addr_test1script"),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["token"]["utxo"]["output_index"], -1);
        assert_eq!(body["token"]["utxo"]["address"], "");
        assert_eq!(body["unsigned_tx"], "unsigned-tx");
    }

    #[tokio::test]
    async fn update_projects_a_fresh_script_pointer() {
        let (status, body) = post(
            state_with(chain_with_user_unit()),
            "/tokens/update",
            token_request_body("addr_test1script"),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["token"]["utxo"]["output_index"], 0);
        assert_eq!(body["token"]["utxo"]["address"], "addr_test1script");
    }

    #[tokio::test]
    async fn update_without_the_user_unit_is_rejected() {
        let (status, body) = post(
            state_with(MockChain::default()),
            "/tokens/update",
            token_request_body("addr_test1script"),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].as_str().unwrap().contains("user token"));
    }
}
