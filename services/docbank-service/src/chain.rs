use axum::{Json, extract::State};

use dbk_api_types::{ChainSubmitRequest, ChainSubmitResponse};
use dbk_chain_client::UnsignedTx;

use crate::{ApiResult, AppState, bad_request, internal_error};

/// Assemble a wallet-signed witness set with its unsigned transaction and
/// submit the result to the chain.
pub(crate) async fn submit(
    State(state): State<AppState>,
    Json(request): Json<ChainSubmitRequest>,
) -> ApiResult<ChainSubmitResponse> {
    if request.tx.trim().is_empty() {
        return Err(bad_request("tx is required"));
    }
    if request.witness.trim().is_empty() {
        return Err(bad_request("witness is required"));
    }

    let unsigned = UnsignedTx { tx: request.tx };
    let signed = state
        .builder
        .assemble(&unsigned, &request.witness)
        .await
        .map_err(internal_error)?;

    let tx_hash = state
        .chain
        .submit_tx(&signed.tx)
        .await
        .map_err(internal_error)?;

    Ok(Json(ChainSubmitResponse { tx_hash }))
}
