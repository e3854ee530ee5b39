//! Record shapes for the `sets` and `cards` tables.

use super::field::{DefaultValue, FieldKind, FieldSpec, RecordSchema};

/// Set records keyed by set code.
pub static SET_SCHEMA: RecordSchema = RecordSchema {
    table: "sets",
    primary_key: "code",
    fields: &[
        FieldSpec::required("code", FieldKind::Text),
        FieldSpec::required("name", FieldKind::Text),
        FieldSpec::required("set_type", FieldKind::Text),
        FieldSpec::nullable("released_at", FieldKind::Text),
        FieldSpec::required("card_count", FieldKind::Integer),
        FieldSpec::required("digital", FieldKind::Boolean),
        FieldSpec::with_default("foil_only", FieldKind::Boolean, DefaultValue::Boolean(false)),
        FieldSpec::with_default(
            "nonfoil_only",
            FieldKind::Boolean,
            DefaultValue::Boolean(false),
        ),
        FieldSpec::required("icon_svg_uri", FieldKind::Text),
    ],
};

/// Card records keyed by the provider's card id.
///
/// Multi-faced cards carry no top-level cost, text or stats, hence the
/// nullable columns.
pub static CARD_SCHEMA: RecordSchema = RecordSchema {
    table: "cards",
    primary_key: "id",
    fields: &[
        FieldSpec::required("id", FieldKind::Text),
        FieldSpec::required("name", FieldKind::Text),
        FieldSpec::nullable("mana_cost", FieldKind::Text),
        FieldSpec::nullable("cmc", FieldKind::Real),
        FieldSpec::nullable("type_line", FieldKind::Text),
        FieldSpec::nullable("oracle_text", FieldKind::Text),
        FieldSpec::nullable("power", FieldKind::Text),
        FieldSpec::nullable("toughness", FieldKind::Text),
        FieldSpec::nullable("colors", FieldKind::TextList),
        FieldSpec::required("color_identity", FieldKind::TextList),
        FieldSpec::required("rarity", FieldKind::Text),
        FieldSpec::required("set", FieldKind::Text),
        FieldSpec::required("set_name", FieldKind::Text),
        FieldSpec::required("collector_number", FieldKind::Text),
        FieldSpec::nullable("artist", FieldKind::Text),
        FieldSpec::required("layout", FieldKind::Text),
        FieldSpec::nullable("all_parts", FieldKind::Json),
    ],
};
