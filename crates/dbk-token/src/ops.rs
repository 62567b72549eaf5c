//! Async executors: plan, build, sign, submit.

use std::time::{SystemTime, UNIX_EPOCH};

use tracing::info;

use dbk_chain_client::{ChainError, ChainProvider, TxBuilder, TxPlan, WalletSession};
use dbk_wallet::WalletConnection;

use crate::error::TokenError;
use crate::plan::{cip68_metadata_map, datum_to_json, plan_burn, plan_mint, plan_update};
use crate::script::{LABEL_HEX_LEN, ScriptConfig, USR_LABEL, ref_unit_from_user_asset, unit};
use crate::{Token, TokenParams};

fn now_epoch_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or_default()
}

async fn build_sign_submit(
    plan: &TxPlan,
    session: &dyn WalletSession,
    builder: &dyn TxBuilder,
    chain: &dyn ChainProvider,
) -> Result<String, TokenError> {
    let unsigned = builder.build(plan).await?;
    let signed = session.sign_tx(&unsigned).await?;
    let tx_hash = chain.submit_tx(&signed.tx).await?;
    Ok(tx_hash)
}

fn connected_parts(
    connection: &WalletConnection,
) -> Result<(&dyn ChainProvider, &dyn WalletSession), TokenError> {
    let chain = connection
        .chain
        .as_deref()
        .ok_or(ChainError::NotConnected)?;
    let session = connection
        .session
        .as_deref()
        .ok_or(ChainError::WalletDisconnected)?;
    Ok((chain, session))
}

/// Mint a token pair (plus the optional metadata unit) for `params`.
pub async fn mint(
    params: &TokenParams,
    metadata_url: Option<&str>,
    connection: &WalletConnection,
    builder: &dyn TxBuilder,
    script: &ScriptConfig,
) -> Result<Token, TokenError> {
    let (chain, session) = connected_parts(connection)?;

    let wallet_utxos = session.utxos().await?;
    if wallet_utxos.is_empty() {
        return Err(TokenError::EmptyWallet);
    }
    let wallet_address = session.address().await?;

    let prepared = plan_mint(
        params,
        metadata_url,
        &wallet_address,
        &wallet_utxos,
        script,
        now_epoch_ms(),
    )?;

    let tx_hash = build_sign_submit(&prepared.plan, session, builder, chain).await?;
    info!(%tx_hash, token = %params.name, "minted token");

    Ok(prepared.token.with_tx_hash(tx_hash))
}

/// Rewrite a token's inline datum, returning it with a fresh UTxO pointer.
pub async fn update(
    token: &Token,
    connection: &WalletConnection,
    builder: &dyn TxBuilder,
    script: &ScriptConfig,
) -> Result<Token, TokenError> {
    let (chain, session) = connected_parts(connection)?;
    if connection.address.is_empty() {
        return Err(ChainError::WalletDisconnected.into());
    }

    let usr_unit = unit(&script.policy_id, USR_LABEL, &token.asset_name);
    let user_inputs = chain
        .utxos_at_with_unit(&connection.address, &usr_unit)
        .await?;

    let prepared = plan_update(token, &user_inputs, script, now_epoch_ms())?;
    let tx_hash = build_sign_submit(&prepared.plan, session, builder, chain).await?;
    info!(%tx_hash, token = %token.name, "updated token");

    Ok(prepared.token.with_tx_hash(tx_hash))
}

/// Remove both units from circulation; the returned token carries the
/// sentinel "no output" pointer.
pub async fn burn(
    token: &Token,
    connection: &WalletConnection,
    builder: &dyn TxBuilder,
    script: &ScriptConfig,
) -> Result<Token, TokenError> {
    let (chain, session) = connected_parts(connection)?;
    if connection.address.is_empty() {
        return Err(ChainError::WalletDisconnected.into());
    }

    let usr_unit = unit(&script.policy_id, USR_LABEL, &token.asset_name);
    let user_inputs = chain
        .utxos_at_with_unit(&connection.address, &usr_unit)
        .await?;

    let prepared = plan_burn(token, &user_inputs, script, now_epoch_ms())?;
    let tx_hash = build_sign_submit(&prepared.plan, session, builder, chain).await?;
    info!(%tx_hash, token = %token.name, "burned token");

    Ok(prepared.token.with_tx_hash(tx_hash))
}

/// Tokens held by the connected wallet: its user units mapped to their
/// reference units at the script address, with datum metadata decoded,
/// sorted case-insensitively by name.
pub async fn list_tokens(
    connection: &WalletConnection,
    script: &ScriptConfig,
) -> Result<Vec<Token>, TokenError> {
    let chain = connection
        .chain
        .as_deref()
        .ok_or(ChainError::NotConnected)?;
    if connection.address.is_empty() {
        return Err(ChainError::WalletDisconnected.into());
    }

    let holdings = chain
        .address_assets(&connection.address, &script.policy_id)
        .await?;
    let ref_units: Vec<String> = holdings
        .iter()
        .filter_map(|entry| ref_unit_from_user_asset(&entry.policy_id, &entry.asset_name))
        .collect();

    let script_utxos = chain.utxos_at(&script.address).await?;

    let name_key = dbk_chain_client::PlutusData::text("name");
    let image_key = dbk_chain_client::PlutusData::text("image");

    let mut tokens = Vec::new();
    for ref_unit in ref_units {
        // A user unit without its reference output should never happen.
        let Some(utxo) = script_utxos.iter().find(|u| u.assets.contains_key(&ref_unit)) else {
            continue;
        };
        let Some(metadata_map) = utxo.datum.as_ref().and_then(cip68_metadata_map) else {
            continue;
        };
        let Some(name) = metadata_map.map_get(&name_key).and_then(|v| v.as_text()) else {
            continue;
        };
        let image = metadata_map
            .map_get(&image_key)
            .and_then(|v| v.as_text())
            .unwrap_or_default();

        let metadata = match datum_to_json(metadata_map) {
            serde_json::Value::Object(object) => object,
            _ => serde_json::Map::new(),
        };

        let asset_name = ref_unit[script.policy_id.len() + LABEL_HEX_LEN..].to_owned();

        tokens.push(Token {
            name,
            image,
            utxo: utxo.clone(),
            asset_name,
            metadata,
        });
    }

    tokens.sort_by(|l, r| l.name.to_uppercase().cmp(&r.name.to_uppercase()));
    Ok(tokens)
}
