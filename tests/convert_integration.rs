use std::fs;
use std::path::{Path, PathBuf};

use onbase_export::combine::{ConsolidateError, ConsolidationOutcome};
use onbase_export::config::Config;
use onbase_export::contract::{MockPageMerger, MockTabularExporter};
use onbase_export::convert::{convert, convert_with, ConvertError, ExportTarget};
use onbase_export::document::Document;
use onbase_export::export::{CsvExporter, ExportError};
use onbase_export::schema::Column;
use tempfile::{tempdir, TempDir};

const DUMP: &str = "OnBase Disk Dump\n\
BEGIN:\n\
>DocTypeName: Invoice\n\
>Document Handle: 1001\n\
>FileName: VOL1\\0001\\1001.tif\n\
BEGIN:\n\
>DocTypeName: Statement\n\
>Document Handle: 1002\n\
>FileName: VOL1\\0001\\1002a.tif\n\
>Xdpi: 300\n\
>FileName: VOL1\\0001\\1002b.tif\n\
BEGIN:\n\
>DocTypeName: Invoice\n\
>Document Handle: 1001\n\
>FileName: VOL1\\0001\\1003.pdf\n\
END:\n";

struct Workspace {
    _root: TempDir,
    config: Config,
}

fn workspace(dump: &str) -> Workspace {
    let root = tempdir().unwrap();
    let data = root.path().join("data");
    fs::create_dir_all(data.join("0001")).unwrap();
    fs::write(data.join("dump.txt"), dump).unwrap();
    for name in ["1001.tif", "1002a.tif", "1002b.tif", "1003.pdf"] {
        fs::write(data.join("0001").join(name), name).unwrap();
    }

    let mut config = Config::default();
    config.import.data_directory = data;
    config.import.import_file_path = PathBuf::from("dump.txt");
    config.export.export_directory = root.path().join("exports");
    config.combine.combined_file_directory = root.path().join("combined");

    Workspace {
        _root: root,
        config,
    }
}

fn listing_merger() -> MockPageMerger {
    let mut merger = MockPageMerger::new();
    merger
        .expect_open_page()
        .returning(|path: &Path| Ok(path.to_path_buf()));
    merger
        .expect_write_merged()
        .returning(|pages: Vec<PathBuf>, destination: &Path| {
            if pages.is_empty() {
                return Err(ConsolidateError::NoPages);
            }
            fs::write(destination, format!("{} pages", pages.len())).unwrap();
            Ok(())
        });
    merger
}

#[test]
fn full_pipeline_combines_and_exports_with_file_links() {
    let ws = workspace(DUMP);
    let merger = listing_merger();
    let csv = CsvExporter;
    let targets = [ExportTarget {
        exporter: &csv,
        destination: ws.config.csv_path(),
    }];

    let (documents, summary) = convert_with(&ws.config, &merger, &targets).expect("conversion");

    assert_eq!(summary.documents, 3);
    let handles: Vec<_> = documents.iter().map(|d| d.handle().unwrap()).collect();
    assert_eq!(handles, vec!["1001", "1002", "1001_2"]);

    let combined = &ws.config.combine.combined_file_directory;
    assert!(combined.is_dir(), "combined directory is created");
    assert_eq!(fs::read(combined.join("1001.tif")).unwrap(), b"1001.tif");
    assert_eq!(fs::read_to_string(combined.join("1002.pdf")).unwrap(), "2 pages");
    assert_eq!(fs::read(combined.join("1001_2.pdf")).unwrap(), b"1003.pdf");

    let consolidation = summary.consolidation.expect("combine ran");
    assert_eq!(consolidation.failed(), 0);
    assert_eq!(
        consolidation.documents[1].outcome,
        ConsolidationOutcome::Merged {
            pages: 2,
            omitted: 0
        }
    );

    assert_eq!(summary.exports.len(), 1);
    assert!(summary.exports[0].succeeded());
    let csv_text = fs::read_to_string(ws.config.csv_path()).unwrap();
    let lines: Vec<&str> = csv_text.lines().collect();
    assert_eq!(lines.len(), 4);
    assert!(lines[0].ends_with(",Document Handle,File Link"));
    assert!(lines[2].contains("1002.pdf"));
}

#[test]
fn failing_exporter_does_not_stop_the_next_one() {
    let ws = workspace(DUMP);
    let merger = listing_merger();

    let mut broken = MockTabularExporter::new();
    broken.expect_format().return_const("csv");
    broken
        .expect_export()
        .times(1)
        .returning(|_docs: &[Document], _columns: &[Column], _dest: &Path| {
            Err(ExportError::Io(std::io::Error::other("disk full")))
        });

    let mut healthy = MockTabularExporter::new();
    healthy.expect_format().return_const("excel");
    healthy
        .expect_export()
        .times(1)
        .returning(|docs: &[Document], columns: &[Column], _dest: &Path| {
            assert_eq!(docs.len(), 3);
            assert_eq!(columns.last(), Some(&Column::FileLink));
            assert!(docs.iter().all(|d| d.file_link.is_some()));
            Ok(())
        });

    let targets = [
        ExportTarget {
            exporter: &broken,
            destination: ws.config.csv_path(),
        },
        ExportTarget {
            exporter: &healthy,
            destination: ws.config.excel_path(),
        },
    ];
    let (_, summary) = convert_with(&ws.config, &merger, &targets).unwrap();

    assert_eq!(summary.exports.len(), 2);
    assert!(!summary.exports[0].succeeded());
    assert!(summary.exports[0].error.as_deref().unwrap().contains("disk full"));
    assert!(summary.exports[1].succeeded());
}

#[test]
fn import_failure_aborts_before_any_output() {
    let ws = workspace("header\nBEGIN:\n>Document Handle: 1\n>Shoe Size: 44\nEND:\n");

    let mut merger = MockPageMerger::new();
    merger.expect_open_page().never();
    merger.expect_write_merged().never();
    let mut exporter = MockTabularExporter::new();
    exporter.expect_format().never();
    exporter.expect_export().never();
    let targets = [ExportTarget {
        exporter: &exporter,
        destination: ws.config.csv_path(),
    }];

    let err = convert_with(&ws.config, &merger, &targets).unwrap_err();
    assert!(matches!(err, ConvertError::Import(_)));
    assert!(!ws.config.combine.combined_file_directory.exists());
    assert!(!ws.config.export.export_directory.exists());
}

#[test]
fn lenient_policy_imports_past_unknown_attributes() {
    let mut ws = workspace("header\nBEGIN:\n>Document Handle: 1\n>Shoe Size: 44\nEND:\n");
    ws.config.import.schema_policy = onbase_export::import::SchemaPolicy::Lenient;
    ws.config.combine.combine_files = false;

    let merger = MockPageMerger::new();
    let (documents, summary) = convert_with(&ws.config, &merger, &[]).unwrap();
    assert_eq!(documents.len(), 1);
    assert!(summary.exports.is_empty());
}

#[test]
fn missing_dump_is_reported_with_its_path() {
    let mut ws = workspace(DUMP);
    ws.config.import.import_file_path = PathBuf::from("absent.txt");

    let merger = MockPageMerger::new();
    let err = convert_with(&ws.config, &merger, &[]).unwrap_err();
    match err {
        ConvertError::ReadDump { path, .. } => assert!(path.ends_with("absent.txt")),
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn disabled_combine_exports_without_file_link() {
    let mut ws = workspace(DUMP);
    ws.config.combine.combine_files = false;

    let (documents, summary) = convert(&ws.config).expect("conversion");

    assert!(summary.consolidation.is_none());
    assert!(documents.iter().all(|d| d.file_link.is_none()));
    assert!(!ws.config.combine.combined_file_directory.exists());

    let csv_text = fs::read_to_string(ws.config.csv_path()).unwrap();
    let header = csv_text.lines().next().unwrap();
    assert!(header.ends_with("Document Handle"));
    assert!(!header.contains("File Link"));
    assert!(ws.config.excel_path().is_file());
    assert_eq!(summary.exports.len(), 2);
}

#[test]
fn summary_serialises_for_the_cli() {
    let mut ws = workspace(DUMP);
    ws.config.combine.combine_files = false;
    ws.config.export.export_excel = false;

    let (_, summary) = convert(&ws.config).unwrap();
    let json = serde_json::to_value(&summary).unwrap();
    assert_eq!(json["documents"], 3);
    assert_eq!(json["exports"][0]["format"], "csv");
    assert!(json.get("consolidation").is_none());
}
