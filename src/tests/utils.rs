use crate::net::{HttpResponse, Transport, TransportError};
use serde_json::{json, Value};
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

pub const OLX_URL: &str = "http://olx.test/autos/carros";
pub const FIPE_URL: &str = "http://fipe.test/api/v1";

#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub url: String,
    pub query: Vec<(String, String)>,
}

impl RecordedRequest {
    pub fn param(&self, key: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}

/// Scripted transport keyed by exact URL. Each URL serves its responses in
/// order and keeps repeating the last one; unknown URLs get a 404.
#[derive(Default)]
pub struct FakeTransport {
    routes: Mutex<HashMap<String, VecDeque<Result<HttpResponse, TransportError>>>>,
    requests: Mutex<Vec<RecordedRequest>>,
}

impl FakeTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(self, url: &str, status: u16, body: impl Into<String>) -> Self {
        self.push(url, Ok(HttpResponse::new(status, body)))
    }

    pub fn json(self, url: &str, body: Value) -> Self {
        self.respond(url, 200, body.to_string())
    }

    pub fn fail(self, url: &str) -> Self {
        self.push(url, Err(TransportError::Timeout("simulated".into())))
    }

    fn push(self, url: &str, resp: Result<HttpResponse, TransportError>) -> Self {
        self.routes
            .lock()
            .unwrap()
            .entry(url.to_string())
            .or_default()
            .push_back(resp);
        self
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn requests_to(&self, prefix: &str) -> Vec<RecordedRequest> {
        self.requests()
            .into_iter()
            .filter(|r| r.url.starts_with(prefix))
            .collect()
    }
}

impl Transport for FakeTransport {
    fn get(
        &self,
        url: &str,
        query: &[(String, String)],
        _headers: &[(&str, &str)],
    ) -> Result<HttpResponse, TransportError> {
        self.requests.lock().unwrap().push(RecordedRequest {
            url: url.to_string(),
            query: query.to_vec(),
        });

        let mut routes = self.routes.lock().unwrap();
        match routes.get_mut(url) {
            Some(queue) if queue.len() > 1 => queue.pop_front().unwrap(),
            Some(queue) => queue.front().cloned().unwrap(),
            None => Ok(HttpResponse::new(404, "not found")),
        }
    }
}

/// Search results page wrapping `ads` the way the marketplace embeds them.
pub fn results_page(ads: Value) -> String {
    let data = json!({
        "props": { "pageProps": { "ads": ads } },
        "page": "/autos-e-pecas",
    });
    format!(
        r#"<!DOCTYPE html><html><head><title>OLX</title></head><body>
        <div id="__next"></div>
        <script id="__NEXT_DATA__" type="application/json">{data}</script>
        </body></html>"#
    )
}

pub fn ad(id: u64, subject: &str, price: &str) -> Value {
    json!({
        "listId": id,
        "subject": subject,
        "price": price,
        "properties": [],
        "location": { "municipality": "São Paulo", "uf": "SP" },
        "url": format!("https://sp.olx.com.br/{id}"),
        "listTime": "2024-05-01T10:00:00Z"
    })
}

pub fn ad_with_usage(id: u64, subject: &str, price: &str, year: i32, km: i64) -> Value {
    let mut ad = ad(id, subject, price);
    ad["properties"] = json!([
        { "name": "regdate", "value": year.to_string() },
        { "name": "mileage", "value": km.to_string() },
        { "name": "gearbox", "value": "Manual" }
    ]);
    ad
}

/// Catalog with Honda (code 1) -> "Civic EXL" (code 10) priced at R$ 90.000
/// for 2020, plus an unrelated Toyota.
pub fn honda_catalog(transport: FakeTransport) -> FakeTransport {
    transport
        .json(
            &format!("{FIPE_URL}/carros/marcas"),
            json!([
                { "codigo": "2", "nome": "Toyota" },
                { "codigo": "1", "nome": "Honda" }
            ]),
        )
        .json(
            &format!("{FIPE_URL}/carros/marcas/1/modelos"),
            json!({
                "modelos": [
                    { "codigo": 10, "nome": "Civic EXL" },
                    { "codigo": 11, "nome": "Fit LX" }
                ],
                "anos": []
            }),
        )
        .json(
            &format!("{FIPE_URL}/carros/marcas/1/modelos/10/anos"),
            json!([
                { "codigo": "2021-1", "nome": "2021 Gasolina" },
                { "codigo": "2020-1", "nome": "2020 Gasolina" }
            ]),
        )
        .json(
            &format!("{FIPE_URL}/carros/marcas/1/modelos/10/anos/2020-1"),
            json!({ "Valor": "R$ 90.000,00", "Modelo": "Civic EXL", "AnoModelo": 2020 }),
        )
}
