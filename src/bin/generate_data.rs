use synop_features::io::JsonField;
use synop_features::test_support::synthetic_omega_field;
use std::fs::File;
use std::io::Write;

/// Generates a synthetic geopotential-height field (one high flanked by
/// two lows, see `test_support::synthetic_omega_field`) and writes it
/// as a demo `field.json` file that `JsonFieldSource` can load, for
/// manually exercising the binary without a real gridded data file.
fn main() -> Result<(), Box<dyn std::error::Error>> {
    let n_lat = 40;
    let n_lon = 60;
    let adapter = synthetic_omega_field(n_lat, n_lon);

    let mut data = Vec::with_capacity(n_lat * n_lon);
    let view = adapter.view(0);
    for i in 0..n_lat {
        for j in 0..n_lon {
            data.push(view.get(i, j));
        }
    }

    let field = JsonField {
        lats: adapter.lats.clone(),
        lons: adapter.lons.clone(),
        n_time: 1,
        data,
        scale_factor: adapter.scale_factor,
        add_offset: adapter.add_offset,
        long_name: "geopotential_height".to_string(),
        variable_name: "z".to_string(),
    };

    let mut file = File::create("field.json")?;
    write!(file, "{}", serde_json::to_string_pretty(&field)?)?;
    println!("Generated field.json with {} x {} grid.", n_lat, n_lon);
    Ok(())
}
