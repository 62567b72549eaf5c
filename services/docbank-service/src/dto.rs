//! Conversions between domain types and the HTTP DTOs.

use dbk_api_types::{TokenDto, UtxoDto};
use dbk_chain_client::{PlutusData, Utxo};
use dbk_token::Token;

pub(crate) fn utxo_to_dto(utxo: &Utxo) -> UtxoDto {
    UtxoDto {
        tx_hash: utxo.tx_hash.clone(),
        output_index: utxo.output_index,
        address: utxo.address.clone(),
        assets: utxo.assets.clone(),
        datum: utxo
            .datum
            .as_ref()
            .and_then(|datum| serde_json::to_value(datum).ok()),
    }
}

pub(crate) fn utxo_from_dto(dto: UtxoDto) -> Result<Utxo, serde_json::Error> {
    let datum = dto
        .datum
        .map(serde_json::from_value::<PlutusData>)
        .transpose()?;
    Ok(Utxo {
        tx_hash: dto.tx_hash,
        output_index: dto.output_index,
        address: dto.address,
        assets: dto.assets,
        datum,
    })
}

pub(crate) fn token_to_dto(token: &Token) -> TokenDto {
    TokenDto {
        name: token.name.clone(),
        image: token.image.clone(),
        asset_name: token.asset_name.clone(),
        utxo: utxo_to_dto(&token.utxo),
        metadata: serde_json::Value::Object(token.metadata.clone()),
    }
}
