use entities::ENTITIES;
use std::io::Write;
use std::{env, path::PathBuf};

fn main() {
    let out_dir: PathBuf = env::var("OUT_DIR").unwrap().parse().unwrap();

    // entity::lookup is handed just the inner entity name, like "amp" for
    // "&amp;"; we only match those with a trailing ";".
    //
    // entities::ENTITIES includes many both with and without a trailing ";".
    // Exclude those without, and then write to source only the name, without
    // the leading or trailing "&" or ";".
    let mut map = phf_codegen::Map::new();
    let mut seen = std::collections::HashSet::new();
    for e in ENTITIES
        .iter()
        .filter(|e| e.entity.starts_with('&') && e.entity.ends_with(';'))
    {
        let name = &e.entity[1..e.entity.len() - 1];
        if seen.insert(name) {
            map.entry(name, &format!("{:?}", e.characters));
        }
    }

    let out = std::fs::File::create(out_dir.join("entitydata.rs")).unwrap();
    let mut bw = std::io::BufWriter::new(out);
    write!(
        bw,
        "static ENTITY_MAP: phf::Map<&'static str, &'static str> = {};\n",
        map.build()
    )
    .unwrap();
}
