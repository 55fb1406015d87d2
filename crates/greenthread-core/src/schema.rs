/// Feature layout for the carbon-emission predictor.
pub mod carbon {
    use arrow::datatypes::{DataType, Field, Schema};

    /// Request keys read by the carbon pipeline.
    pub const MATERIAL_QUANTITY_KG: &str = "material_quantity_kg";
    pub const ENERGY_USED_KWH: &str = "energy_used_kwh";
    pub const TRANSPORT_DISTANCE_KM: &str = "transport_distance_km";
    pub const PRODUCT_WEIGHT_KG: &str = "product_weight_kg";
    pub const RECYCLED_MATERIAL_PERCENT: &str = "recycled_material_percent";
    pub const PRIMARY_MATERIAL: &str = "primary_material";
    pub const PRODUCTION_TYPE: &str = "production_type";

    /// Columns the feature scaler was fit on, in fit order.
    pub const SCALER_FEATURES: [&str; 17] = [
        "product_weight_kg",
        "handmade_level",
        "material_quantity_kg",
        "recycled_material_percent",
        "organic_material",
        "production_time_hours",
        "units_per_batch",
        "energy_used_kwh",
        "renewable_energy_percent",
        "transport_distance_km",
        "transport_load_kg",
        "local_or_export",
        "packaging_weight_kg",
        "recyclable_packaging",
        "material_efficiency",
        "production_efficiency",
        "total_recycled_material_kg",
    ];

    /// Categorical fields expanded into `<field>_<value>` dummy columns.
    pub const ONE_HOT_FIELDS: [&str; 2] = [PRIMARY_MATERIAL, PRODUCTION_TYPE];

    /// Schema of the single-row frame handed to the scaler.
    pub fn scaler_input_schema() -> Schema {
        Schema::new(
            SCALER_FEATURES
                .iter()
                .map(|name| Field::new(*name, DataType::Float64, false))
                .collect::<Vec<_>>(),
        )
    }
}

/// Feature layout for the resale price predictor.
pub mod price {
    /// Request keys read by the price pipeline.
    pub const WEIGHT_G: &str = "weight_g";
    pub const SIZE_CM: &str = "size_cm";
    pub const MATERIAL: &str = "material";
    pub const REGION: &str = "region";

    /// Numeric training columns, passed to the model unscaled.
    pub const NUMERIC_FEATURES: [&str; 4] = ["Weight(g)", "Size_L", "Size_W", "Size_H"];

    /// Request key → label-encoded training column.
    pub const CATEGORICAL_COLUMNS: [(&str, &str); 4] = [
        ("product_name", "Product_Name"),
        ("material", "Material"),
        ("category", "Category"),
        ("region", "Region"),
    ];
}
