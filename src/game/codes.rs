// src/game/codes.rs
//
// Serde adapters for the shakmaty types used at the boundary: squares as
// "e4", pieces as their FEN char, colors as "white"/"black".

pub mod square_serde {
    use serde::{de::Error, Deserialize, Deserializer, Serializer};
    use shakmaty::Square;

    pub fn serialize<S>(sq: &Square, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&sq.to_string())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Square, D::Error>
    where
        D: Deserializer<'de>,
    {
        let text = String::deserialize(deserializer)?;
        text.parse::<Square>()
            .map_err(|_| D::Error::custom(format!("invalid square: {text}")))
    }
}

pub mod piece_serde {
    use serde::{de::Error, Deserialize, Deserializer, Serializer};
    use shakmaty::Piece;

    pub fn serialize<S>(piece: &Piece, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_char(piece.char())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Piece, D::Error>
    where
        D: Deserializer<'de>,
    {
        let code = char::deserialize(deserializer)?;
        Piece::from_char(code).ok_or_else(|| D::Error::custom(format!("invalid piece: {code}")))
    }
}

pub mod opt_piece_serde {
    use serde::{de::Error, Deserialize, Deserializer, Serializer};
    use shakmaty::Piece;

    pub fn serialize<S>(piece: &Option<Piece>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match piece {
            Some(piece) => serializer.serialize_some(&piece.char()),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<Piece>, D::Error>
    where
        D: Deserializer<'de>,
    {
        match Option::<char>::deserialize(deserializer)? {
            Some(code) => Piece::from_char(code)
                .map(Some)
                .ok_or_else(|| D::Error::custom(format!("invalid piece: {code}"))),
            None => Ok(None),
        }
    }
}

pub mod color_serde {
    use serde::{de::Error, Deserialize, Deserializer, Serializer};
    use shakmaty::Color;

    pub fn serialize<S>(color: &Color, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(crate::error::color_name(*color))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Color, D::Error>
    where
        D: Deserializer<'de>,
    {
        match String::deserialize(deserializer)?.as_str() {
            "white" => Ok(Color::White),
            "black" => Ok(Color::Black),
            other => Err(D::Error::custom(format!("invalid color: {other}"))),
        }
    }
}
