use criterion::{black_box, criterion_group, criterion_main, Criterion};
use data_validator::REQUIRED_FIELDS;
use feature_engine::FeatureAssembler;
use serde_json::{json, Map, Value};

fn payload() -> Value {
    let mut map = Map::new();
    for (i, name) in REQUIRED_FIELDS.iter().enumerate() {
        map.insert(name.to_string(), json!(10.0 + i as f64));
    }
    map.insert("brand".to_string(), json!("toyota"));
    Value::Object(map)
}

fn layout() -> Vec<String> {
    let mut columns: Vec<String> = REQUIRED_FIELDS[1..].iter().map(|s| s.to_string()).collect();
    columns.push("km_per_year".to_string());
    columns.push("temp_difference".to_string());
    for brand in ["Ford", "Honda", "Toyota", "Volkswagen"] {
        columns.push(format!("Brand_{}", brand));
    }
    columns
}

fn bench_assemble(c: &mut Criterion) {
    let assembler = FeatureAssembler::default();
    let payload = payload();
    let columns = layout();

    c.bench_function("assemble_payload", |b| {
        b.iter(|| assembler.assemble_payload(black_box(&payload), black_box(&columns)))
    });
}

criterion_group!(benches, bench_assemble);
criterion_main!(benches);
