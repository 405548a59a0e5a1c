// src/tests/resolver_tests.rs

use super::utils::{honda_catalog, FakeTransport, FIPE_URL};
use crate::fipe::{FipeClient, PriceResolver, ReferencePrice, MAX_MODEL_CANDIDATES};
use serde_json::json;
use std::sync::Arc;

fn resolver(transport: &Arc<FakeTransport>) -> PriceResolver {
    PriceResolver::new(Box::new(FipeClient::new(transport.clone(), FIPE_URL)))
}

fn url(path: &str) -> String {
    format!("{FIPE_URL}{path}")
}

#[test]
fn resolves_single_trim() {
    let transport = Arc::new(honda_catalog(FakeTransport::new()));

    let result = resolver(&transport).resolve("Honda Civic", 2020);

    assert_eq!(result, ReferencePrice::found(90_000.0, "Average of 1 trims."));
}

#[test]
fn averages_every_priced_trim() {
    let transport = Arc::new(
        FakeTransport::new()
            .json(&url("/carros/marcas"), json!([{ "codigo": 21, "nome": "Fiat" }]))
            .json(
                &url("/carros/marcas/21/modelos"),
                json!({ "modelos": [
                    { "codigo": 1, "nome": "Uno Mille 1.0" },
                    { "codigo": 2, "nome": "Uno Way 1.4" },
                    { "codigo": 3, "nome": "Uno Vivace 1.0" },
                    { "codigo": 4, "nome": "Palio 1.0" }
                ]}),
            )
            .json(&url("/carros/marcas/21/modelos/1/anos"), json!([{ "codigo": "2012-1", "nome": "2012 Gasolina" }]))
            .json(&url("/carros/marcas/21/modelos/2/anos"), json!([{ "codigo": "2012-1", "nome": "2012 Flex" }]))
            .json(&url("/carros/marcas/21/modelos/3/anos"), json!([{ "codigo": "2015-1", "nome": "2015 Flex" }]))
            .json(&url("/carros/marcas/21/modelos/1/anos/2012-1"), json!({ "Valor": "R$ 20.000,00" }))
            .json(&url("/carros/marcas/21/modelos/2/anos/2012-1"), json!({ "Valor": "R$ 25.000,00" })),
    );

    let result = resolver(&transport).resolve("fiat uno", 2012);

    assert_eq!(result, ReferencePrice::found(22_500.0, "Average of 2 trims."));
    // Palio never matched, so its years were never asked for.
    assert!(transport
        .requests_to(&url("/carros/marcas/21/modelos/4"))
        .is_empty());
}

#[test]
fn no_year_short_circuits() {
    let transport = Arc::new(honda_catalog(FakeTransport::new()));

    let result = resolver(&transport).resolve("Honda Civic", 0);

    assert_eq!(result, ReferencePrice::missing("year not provided"));
    assert!(transport.requests().is_empty());
}

#[test]
fn brand_miss() {
    let transport = Arc::new(honda_catalog(FakeTransport::new()));

    let result = resolver(&transport).resolve("Ferrari F40", 1990);

    assert_eq!(result, ReferencePrice::missing("brand not found"));
}

#[test]
fn model_miss_after_brand_hit() {
    let transport = Arc::new(honda_catalog(FakeTransport::new()));

    let result = resolver(&transport).resolve("honda accord", 2020);

    assert_eq!(result, ReferencePrice::missing("model not found"));
}

#[test]
fn missing_year_suggests_recent_ones() {
    let transport = Arc::new(
        FakeTransport::new()
            .json(&url("/carros/marcas"), json!([{ "codigo": 1, "nome": "Honda" }]))
            .json(
                &url("/carros/marcas/1/modelos"),
                json!({ "modelos": [{ "codigo": 10, "nome": "Civic EXL" }, { "codigo": 12, "nome": "Civic LXR" }] }),
            )
            .json(
                &url("/carros/marcas/1/modelos/10/anos"),
                json!([
                    { "codigo": "2016-1", "nome": "2016 Gasolina" },
                    { "codigo": "2015-1", "nome": "2015 Gasolina" },
                    { "codigo": "2014-1", "nome": "2014 Gasolina" }
                ]),
            )
            .json(
                &url("/carros/marcas/1/modelos/12/anos"),
                json!([
                    { "codigo": "2019-1", "nome": "2019 Gasolina" },
                    { "codigo": "2018-1", "nome": "2018 Gasolina" },
                    { "codigo": "2016-1", "nome": "2016 Gasolina" }
                ]),
            ),
    );

    let result = resolver(&transport).resolve("Honda Civic", 2023);

    assert_eq!(
        result,
        ReferencePrice::missing("not available in 2023. Try: 2019, 2018, 2016, 2015, 2014...")
    );
}

#[test]
fn year_unavailable_when_no_years_at_all() {
    let transport = Arc::new(
        FakeTransport::new()
            .json(&url("/carros/marcas"), json!([{ "codigo": 1, "nome": "Honda" }]))
            .json(&url("/carros/marcas/1/modelos"), json!({ "modelos": [{ "codigo": 10, "nome": "Civic" }] }))
            .json(&url("/carros/marcas/1/modelos/10/anos"), json!([])),
    );

    let result = resolver(&transport).resolve("Honda Civic", 2020);

    assert_eq!(result, ReferencePrice::missing("year 2020 unavailable"));
}

#[test]
fn failing_candidate_is_skipped() {
    let transport = Arc::new(
        FakeTransport::new()
            .json(&url("/carros/marcas"), json!([{ "codigo": 1, "nome": "Honda" }]))
            .json(
                &url("/carros/marcas/1/modelos"),
                json!({ "modelos": [
                    { "codigo": 9, "nome": "Civic LXS" },
                    { "codigo": 8, "nome": "Civic Si" },
                    { "codigo": 10, "nome": "Civic EXL" }
                ]}),
            )
            .fail(&url("/carros/marcas/1/modelos/9/anos"))
            .json(&url("/carros/marcas/1/modelos/8/anos"), json!([{ "codigo": "2020-1", "nome": "2020 Gasolina" }]))
            .json(&url("/carros/marcas/1/modelos/8/anos/2020-1"), json!({ "Valor": "consulte" }))
            .json(&url("/carros/marcas/1/modelos/10/anos"), json!([{ "codigo": "2020-1", "nome": "2020 Gasolina" }]))
            .json(&url("/carros/marcas/1/modelos/10/anos/2020-1"), json!({ "Valor": "R$ 90.000,00" })),
    );

    let result = resolver(&transport).resolve("Honda Civic", 2020);

    assert_eq!(result, ReferencePrice::found(90_000.0, "Average of 1 trims."));
}

#[test]
fn unreachable_catalog_is_a_connection_error() {
    let transport = Arc::new(FakeTransport::new().fail(&url("/carros/marcas")));

    let result = resolver(&transport).resolve("Honda Civic", 2020);

    assert_eq!(result, ReferencePrice::missing("connection error"));
}

#[test]
fn garbage_brand_list_is_a_connection_error() {
    let transport = Arc::new(FakeTransport::new().respond(&url("/carros/marcas"), 200, "<html>"));

    let result = resolver(&transport).resolve("Honda Civic", 2020);

    assert_eq!(result, ReferencePrice::missing("connection error"));
}

#[test]
fn candidate_count_is_capped() {
    let models: Vec<_> = (0..MAX_MODEL_CANDIDATES + 10)
        .map(|i| json!({ "codigo": i, "nome": format!("Gol {i}") }))
        .collect();

    let mut transport = FakeTransport::new()
        .json(&url("/carros/marcas"), json!([{ "codigo": 59, "nome": "VW - VolksWagen" }]))
        .json(&url("/carros/marcas/59/modelos"), json!({ "modelos": models }));
    for i in 0..MAX_MODEL_CANDIDATES + 10 {
        transport = transport.json(&url(&format!("/carros/marcas/59/modelos/{i}/anos")), json!([]));
    }
    let transport = Arc::new(transport);

    let result = resolver(&transport).resolve("volks gol", 2010);

    assert!(!result.is_found());
    let year_requests = transport
        .requests()
        .iter()
        .filter(|r| r.url.ends_with("/anos"))
        .count();
    assert_eq!(year_requests, MAX_MODEL_CANDIDATES);
}
