//! Pure transaction planning for mint, update and burn.
//!
//! Planning never touches the network: callers pass the wallet's outputs
//! and the current time in, and get a [`PreparedToken`] back — the
//! declarative plan plus the token as it will look once the transaction
//! lands.

use std::collections::BTreeMap;

use blake2::digest::consts::U28;
use blake2::{Blake2b, Digest};

use dbk_chain_client::{
    OutRef, PlannedOutput, PlutusData, RedeemerSpec, ScriptAttachment, ScriptRole, TxPlan, Utxo,
};

use crate::error::TokenError;
use crate::script::{MDT_LABEL, REF_LABEL, ScriptConfig, USR_LABEL, unit};
use crate::{Token, TokenParams};

type Blake2b224 = Blake2b<U28>;

/// On-chain asset names are capped at 32 bytes; the label prefix takes 4.
pub const MAX_NAME_LEN: usize = 28;

const MAX_IMAGE_LEN: usize = 64;

/// Transactions stay valid for 15 minutes from planning time.
pub const VALIDITY_WINDOW_MS: u64 = 15 * 60 * 1_000;

/// A plan plus the token state it produces. The token's UTxO pointer
/// carries an empty transaction hash until submission fills it in.
#[derive(Debug, Clone)]
pub struct PreparedToken {
    pub plan: TxPlan,
    pub token: Token,
}

pub fn validate_token_name(name: &str) -> Result<(), TokenError> {
    if name.is_empty() {
        return Err(TokenError::NameRequired);
    }
    if name.len() > MAX_NAME_LEN {
        return Err(TokenError::NameTooLong);
    }
    if !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        return Err(TokenError::NameInvalid);
    }
    Ok(())
}

/// The output with the smallest serialized size; ties go to the first
/// occurrence. Consuming it guarantees uniqueness of the derived name.
pub fn select_nonce(utxos: &[Utxo]) -> Option<&Utxo> {
    let mut best: Option<(&Utxo, usize)> = None;
    for utxo in utxos {
        let len = serde_json::to_string(utxo).map(|s| s.len()).unwrap_or(usize::MAX);
        match best {
            Some((_, best_len)) if len >= best_len => {}
            _ => best = Some((utxo, len)),
        }
    }
    best.map(|(utxo, _)| utxo)
}

/// Blake2b-224 of the nonce output reference (transaction hash bytes
/// followed by the big-endian output index), hex-encoded: 56 characters.
pub fn asset_name_from_nonce(nonce: &OutRef) -> Result<String, TokenError> {
    let tx_hash_bytes = hex::decode(&nonce.tx_hash)
        .map_err(|_| TokenError::MalformedTxHash(nonce.tx_hash.clone()))?;

    let mut hasher = Blake2b224::new();
    hasher.update(&tx_hash_bytes);
    hasher.update((nonce.output_index.max(0) as u64).to_be_bytes());
    Ok(hex::encode(hasher.finalize()))
}

fn nonce_constr(nonce: &OutRef) -> Result<PlutusData, TokenError> {
    let tx_hash_bytes = hex::decode(&nonce.tx_hash)
        .map_err(|_| TokenError::MalformedTxHash(nonce.tx_hash.clone()))?;
    Ok(PlutusData::constr(
        0,
        vec![
            PlutusData::bytes(tx_hash_bytes),
            PlutusData::int(i128::from(nonce.output_index)),
        ],
    ))
}

/// Mint action: `Constr 0 [nonce out-ref]`.
pub fn mint_redeemer(nonce: &OutRef) -> Result<PlutusData, TokenError> {
    Ok(PlutusData::constr(0, vec![nonce_constr(nonce)?]))
}

/// Update action: `Constr 1 [input indices]`, computed from the positions
/// of the user-unit inputs in the final transaction input ordering.
pub fn update_redeemer(indices: &[u64]) -> PlutusData {
    PlutusData::constr(
        1,
        indices.iter().map(|&i| PlutusData::int(i128::from(i))).collect(),
    )
}

/// Burn action: `Constr 2 []`.
pub fn burn_redeemer() -> PlutusData {
    PlutusData::constr(2, Vec::new())
}

fn json_to_datum(value: &serde_json::Value) -> PlutusData {
    match value {
        serde_json::Value::Object(entries) => PlutusData::map(
            entries
                .iter()
                .map(|(k, v)| (PlutusData::text(k), json_to_datum(v)))
                .collect(),
        ),
        serde_json::Value::String(s) => PlutusData::text(s),
        other => PlutusData::text(other.to_string()),
    }
}

/// The CIP-68 datum: `Constr 0 [metadata map, version 1, extra]`, where
/// extra carries the external metadata URL pair when one exists.
pub fn cip68_datum(
    name: &str,
    image: &str,
    custom: Option<&serde_json::Value>,
    metadata_url: Option<&str>,
) -> PlutusData {
    let mut entries = vec![
        (PlutusData::text("name"), PlutusData::text(name)),
        (PlutusData::text("image"), PlutusData::text(image)),
    ];

    if let Some(serde_json::Value::Object(custom)) = custom {
        for (key, value) in custom {
            entries.push((PlutusData::text(key), json_to_datum(value)));
        }
    }

    let extra = match metadata_url {
        Some(url) => PlutusData::list(vec![
            PlutusData::text("metadata_url"),
            PlutusData::text(url),
        ]),
        None => PlutusData::list(Vec::new()),
    };

    PlutusData::constr(0, vec![PlutusData::map(entries), PlutusData::int(1), extra])
}

/// The metadata map inside a CIP-68 datum, when the datum has the shape.
pub fn cip68_metadata_map(datum: &PlutusData) -> Option<&PlutusData> {
    match datum {
        PlutusData::Constr { tag: 0, fields } => match fields.first() {
            Some(map @ PlutusData::Map { .. }) => Some(map),
            _ => None,
        },
        _ => None,
    }
}

/// Render a datum value for the free-form token metadata object.
pub fn datum_to_json(value: &PlutusData) -> serde_json::Value {
    match value {
        PlutusData::Bytes { value: bytes } => match String::from_utf8(bytes.clone()) {
            Ok(text) => serde_json::Value::String(text),
            Err(_) => serde_json::Value::String(hex::encode(bytes)),
        },
        PlutusData::Int { value } => serde_json::Value::String(value.to_string()),
        PlutusData::Map { entries } => {
            let mut object = serde_json::Map::new();
            for (key, entry) in entries {
                let key = key
                    .as_text()
                    .unwrap_or_else(|| match key {
                        PlutusData::Bytes { value } => hex::encode(value),
                        other => format!("{other:?}"),
                    });
                object.insert(key, datum_to_json(entry));
            }
            serde_json::Value::Object(object)
        }
        PlutusData::List { items } => {
            serde_json::Value::Array(items.iter().map(datum_to_json).collect())
        }
        PlutusData::Constr { fields, .. } => {
            serde_json::Value::Array(fields.iter().map(datum_to_json).collect())
        }
    }
}

/// Plan a mint: nonce input, two or three units under the policy, the
/// reference unit paid to the script with the inline datum, the optional
/// metadata unit paid back to the wallet, 15-minute validity window.
pub fn plan_mint(
    params: &TokenParams,
    metadata_url: Option<&str>,
    wallet_address: &str,
    wallet_utxos: &[Utxo],
    script: &ScriptConfig,
    now_epoch_ms: u64,
) -> Result<PreparedToken, TokenError> {
    validate_token_name(&params.name)?;
    if params.image.is_empty() {
        return Err(TokenError::ImageRequired);
    }

    let nonce = select_nonce(wallet_utxos).ok_or(TokenError::EmptyWallet)?;
    let nonce_ref = nonce.out_ref();
    let asset_name = asset_name_from_nonce(&nonce_ref)?;

    let ref_unit = unit(&script.policy_id, REF_LABEL, &asset_name);
    let usr_unit = unit(&script.policy_id, USR_LABEL, &asset_name);
    let mdt_unit = metadata_url.map(|_| unit(&script.policy_id, MDT_LABEL, &asset_name));

    let datum = cip68_datum(
        &params.name,
        &params.image,
        params.metadata.as_ref(),
        metadata_url,
    );

    let mut mint = BTreeMap::new();
    mint.insert(ref_unit.clone(), 1);
    mint.insert(usr_unit.clone(), 1);
    if let Some(mdt_unit) = &mdt_unit {
        mint.insert(mdt_unit.clone(), 1);
    }

    // The user unit rides back to the wallet with the change; only the
    // reference and metadata units need explicit outputs.
    let mut outputs = vec![PlannedOutput {
        address: script.address.clone(),
        assets: BTreeMap::from([(ref_unit.clone(), 1)]),
        inline_datum: Some(datum.clone()),
    }];
    if let Some(mdt_unit) = &mdt_unit {
        outputs.push(PlannedOutput {
            address: wallet_address.to_owned(),
            assets: BTreeMap::from([(mdt_unit.clone(), 1)]),
            inline_datum: None,
        });
    }

    let plan = TxPlan {
        collect: vec![nonce.clone()],
        collect_redeemer: None,
        mint,
        mint_redeemer: Some(RedeemerSpec::Fixed {
            data: mint_redeemer(&nonce_ref)?,
        }),
        script: Some(ScriptAttachment {
            role: ScriptRole::MintingPolicy,
            script: script.script.clone(),
        }),
        outputs,
        valid_until_epoch_ms: now_epoch_ms + VALIDITY_WINDOW_MS,
    };

    let mut metadata = match &params.metadata {
        Some(serde_json::Value::Object(custom)) => custom.clone(),
        _ => serde_json::Map::new(),
    };
    if let Some(url) = metadata_url {
        metadata.insert("metadata_url".to_owned(), serde_json::Value::String(url.to_owned()));
    }
    metadata.insert("ref_unit".to_owned(), serde_json::Value::String(ref_unit.clone()));
    metadata.insert("usr_unit".to_owned(), serde_json::Value::String(usr_unit));
    if let Some(mdt_unit) = mdt_unit {
        metadata.insert("mdt_unit".to_owned(), serde_json::Value::String(mdt_unit));
    }

    let token = Token {
        name: params.name.clone(),
        image: params.image.clone(),
        utxo: Utxo {
            tx_hash: String::new(),
            output_index: 0,
            address: script.address.clone(),
            assets: BTreeMap::from([(ref_unit, 1)]),
            datum: Some(datum),
        },
        asset_name,
        metadata,
    };

    Ok(PreparedToken { plan, token })
}

/// Plan an update: collect the wallet's user-unit inputs plus the current
/// reference output, with an index-dependent redeemer, and re-submit a
/// fresh inline datum to the script address.
pub fn plan_update(
    token: &Token,
    user_inputs: &[Utxo],
    script: &ScriptConfig,
    now_epoch_ms: u64,
) -> Result<PreparedToken, TokenError> {
    validate_token_name(&token.name)?;
    if token.image.is_empty() {
        return Err(TokenError::ImageRequired);
    }
    if token.image.len() > MAX_IMAGE_LEN {
        return Err(TokenError::ImageTooLong { max: MAX_IMAGE_LEN });
    }
    if user_inputs.is_empty() {
        return Err(TokenError::MissingUserToken);
    }

    let datum = cip68_datum(&token.name, &token.image, None, None);
    let ref_unit = unit(&script.policy_id, REF_LABEL, &token.asset_name);

    let mut collect: Vec<Utxo> = user_inputs.to_vec();
    collect.push(token.utxo.clone());

    let plan = TxPlan {
        collect,
        // The payload depends on where the selected inputs land in the
        // final input ordering; the builder resolves the indices.
        collect_redeemer: Some(RedeemerSpec::SelectedInputs {
            inputs: user_inputs.iter().map(Utxo::out_ref).collect(),
            constructor: 1,
        }),
        mint: BTreeMap::new(),
        mint_redeemer: None,
        script: Some(ScriptAttachment {
            role: ScriptRole::SpendingValidator,
            script: script.script.clone(),
        }),
        outputs: vec![PlannedOutput {
            address: script.address.clone(),
            assets: BTreeMap::from([(ref_unit.clone(), 1)]),
            inline_datum: Some(datum.clone()),
        }],
        valid_until_epoch_ms: now_epoch_ms + VALIDITY_WINDOW_MS,
    };

    let updated = Token {
        utxo: Utxo {
            tx_hash: String::new(),
            output_index: 0,
            address: script.address.clone(),
            assets: BTreeMap::from([(ref_unit, 1)]),
            datum: Some(datum),
        },
        ..token.clone()
    };

    Ok(PreparedToken {
        plan,
        token: updated,
    })
}

/// Plan a burn: collect the same inputs as an update and mint both units
/// with negative quantities. The returned token carries the sentinel
/// "no output" pointer.
pub fn plan_burn(
    token: &Token,
    user_inputs: &[Utxo],
    script: &ScriptConfig,
    now_epoch_ms: u64,
) -> Result<PreparedToken, TokenError> {
    if user_inputs.is_empty() {
        return Err(TokenError::MissingUserToken);
    }

    let ref_unit = unit(&script.policy_id, REF_LABEL, &token.asset_name);
    let usr_unit = unit(&script.policy_id, USR_LABEL, &token.asset_name);
    let redeemer = burn_redeemer();

    let mut collect: Vec<Utxo> = user_inputs.to_vec();
    collect.push(token.utxo.clone());

    let plan = TxPlan {
        collect,
        collect_redeemer: Some(RedeemerSpec::Fixed {
            data: redeemer.clone(),
        }),
        mint: BTreeMap::from([(ref_unit, -1), (usr_unit, -1)]),
        mint_redeemer: Some(RedeemerSpec::Fixed { data: redeemer }),
        script: Some(ScriptAttachment {
            role: ScriptRole::Any,
            script: script.script.clone(),
        }),
        outputs: Vec::new(),
        valid_until_epoch_ms: now_epoch_ms + VALIDITY_WINDOW_MS,
    };

    let burned = Token {
        utxo: Utxo::sentinel(""),
        ..token.clone()
    };

    Ok(PreparedToken {
        plan,
        token: burned,
    })
}
