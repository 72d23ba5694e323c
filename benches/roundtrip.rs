use criterion::{black_box, criterion_group, criterion_main, Criterion};
use std::path::Path;
use xbrl_roundtrip::source::{load_document, with_contents};
use xbrl_roundtrip::Verifier;

fn verify_sample_instance(c: &mut Criterion) {
    let verifier = Verifier::new();
    let sample_file = Path::new("tests/fixtures/isdr/isdr-20100630.xml");

    if sample_file.exists() {
        c.bench_function("load_isdr_instance", |b| {
            b.iter(|| with_contents(black_box(sample_file), load_document));
        });

        if let Ok(Ok(root)) = with_contents(sample_file, load_document) {
            c.bench_function("verify_isdr_instance", |b| {
                b.iter(|| verifier.verify_document("isdr-20100630.xml", black_box(&root)));
            });
        }
    } else {
        // If no fixtures exist, use a minimal inline instance for benchmarking
        let minimal_xbrl = r#"<?xml version="1.0" encoding="UTF-8"?>
<xbrli:xbrl xmlns:xbrli="http://www.xbrl.org/2003/instance" xmlns:us-gaap="http://xbrl.us/us-gaap/2009-01-31">
  <xbrli:context id="ctx1">
    <xbrli:entity>
      <xbrli:identifier scheme="http://www.sec.gov/CIK">0000000000</xbrli:identifier>
    </xbrli:entity>
    <xbrli:period>
      <xbrli:instant>2023-12-31</xbrli:instant>
    </xbrli:period>
  </xbrli:context>
  <xbrli:unit id="usd">
    <xbrli:measure>iso4217:USD</xbrli:measure>
  </xbrli:unit>
  <us-gaap:Assets contextRef="ctx1" unitRef="usd" decimals="0">1000</us-gaap:Assets>
</xbrli:xbrl>"#;

        c.bench_function("roundtrip_minimal", |b| {
            b.iter(|| {
                load_document(black_box(minimal_xbrl.as_bytes()))
                    .and_then(|root| verifier.verify_document("minimal.xml", &root))
            });
        });
    }
}

criterion_group!(benches, verify_sample_instance);
criterion_main!(benches);
