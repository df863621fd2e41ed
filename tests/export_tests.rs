use unsga::export::{export_csv, write_csv};
use unsga::prelude::*;

fn report() -> RunReport {
    let config = Configuration::builder()
        .bounds(vec![0.0, 0.0, 0.0], vec![1.0, 1.0, 1.0])
        .constraint(1)
        .population(10)
        .division(4)
        .maximum(3)
        .seed(8)
        .build()
        .unwrap();
    let evaluator = |x: &[f64], f: &mut [f64], g: &mut [f64]| {
        f[0] = x[0];
        f[1] = 1.0 - x[0].sqrt() + x[1] + x[2];
        g[0] = (x[1] - 0.9).max(0.0);
    };
    Unsga::new(config, evaluator).unwrap().run().unwrap()
}

#[test]
fn csv_header_names_every_column() {
    let mut buf = Vec::new();
    write_csv(&mut buf, report().elite()).unwrap();
    let csv = String::from_utf8(buf).unwrap();
    assert_eq!(csv.lines().next(), Some("x0,x1,x2,f0,f1,g0"));
    assert_eq!(csv.lines().count(), 6);
}

#[test]
fn csv_cells_parse_back_to_individual_values() {
    let report = report();
    let mut buf = Vec::new();
    write_csv(&mut buf, report.population()).unwrap();
    let csv = String::from_utf8(buf).unwrap();

    for (line, individual) in csv.lines().skip(1).zip(report.population()) {
        let cells: Vec<f64> = line.split(',').map(|c| c.parse().unwrap()).collect();
        assert_eq!(cells.as_slice(), individual.as_slice());
    }
}

#[test]
fn export_csv_writes_file() {
    let dir = std::env::temp_dir().join(format!("unsga_export_test_{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    let path = dir.join("population.csv");

    let report = report();
    export_csv(&path, report.population()).unwrap();
    let text = std::fs::read_to_string(&path).unwrap();
    assert_eq!(text.lines().count(), 11);
    std::fs::remove_file(&path).unwrap();
}
