use crate::export_core::config::OutputFormat;
use crate::export_core::types::ExportRow;
use crate::export_core::writer_backend::{WriterBackend, WriterError};
use async_trait::async_trait;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

pub const CSV_HEADER: [&str; 10] = [
    "Date",
    "TxHash",
    "TxSrc",
    "TxDest",
    "Sent Amount",
    "Sent Currency",
    "Received Amount",
    "Received Currency",
    "Fee Amount",
    "Fee Currency",
];

const DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

impl ExportRow {
    /// Fields in `CSV_HEADER` order
    pub fn csv_record(&self) -> [String; 10] {
        [
            self.date.format(DATE_FORMAT).to_string(),
            self.signature.clone(),
            self.source.clone(),
            self.destination.clone(),
            self.sent_amount.to_string(),
            self.sent_currency.clone().unwrap_or_default(),
            self.received_amount.to_string(),
            self.received_currency.clone().unwrap_or_default(),
            self.fee_amount.to_string(),
            self.fee_currency.clone(),
        ]
    }
}

fn create_file(path: &Path) -> Result<File, WriterError> {
    let io_err = |source| WriterError::Io {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(io_err)?;
    }

    File::create(path).map_err(io_err)
}

pub struct CsvWriter {
    writer: csv::Writer<File>,
    path: PathBuf,
}

impl CsvWriter {
    /// Truncates `path` and writes the header line
    pub fn new(path: impl AsRef<Path>) -> Result<Self, WriterError> {
        let path = path.as_ref();
        let file = create_file(path)?;

        let mut writer = csv::WriterBuilder::new().has_headers(false).from_writer(file);
        writer.write_record(CSV_HEADER).map_err(|source| WriterError::Csv {
            path: path.to_path_buf(),
            source,
        })?;

        Ok(Self {
            writer,
            path: path.to_path_buf(),
        })
    }

    pub fn write_row(&mut self, row: &ExportRow) -> Result<(), WriterError> {
        self.writer
            .write_record(row.csv_record())
            .map_err(|source| WriterError::Csv {
                path: self.path.clone(),
                source,
            })
    }
}

#[async_trait]
impl WriterBackend for CsvWriter {
    async fn write(&mut self, row: &ExportRow) -> Result<(), WriterError> {
        self.write_row(row)
    }

    async fn flush(&mut self) -> Result<(), WriterError> {
        self.writer.flush().map_err(|source| WriterError::Io {
            path: self.path.clone(),
            source,
        })
    }

    fn backend_type(&self) -> &'static str {
        "CSV"
    }
}

pub struct JsonlWriter {
    file: BufWriter<File>,
    path: PathBuf,
}

impl JsonlWriter {
    pub fn new(path: impl AsRef<Path>) -> Result<Self, WriterError> {
        let path = path.as_ref();
        let file = create_file(path)?;

        Ok(Self {
            file: BufWriter::new(file),
            path: path.to_path_buf(),
        })
    }

    pub fn write_row(&mut self, row: &ExportRow) -> Result<(), WriterError> {
        let json = serde_json::to_string(row)?;
        writeln!(self.file, "{}", json).map_err(|source| WriterError::Io {
            path: self.path.clone(),
            source,
        })
    }
}

#[async_trait]
impl WriterBackend for JsonlWriter {
    async fn write(&mut self, row: &ExportRow) -> Result<(), WriterError> {
        self.write_row(row)
    }

    async fn flush(&mut self) -> Result<(), WriterError> {
        self.file.flush().map_err(|source| WriterError::Io {
            path: self.path.clone(),
            source,
        })
    }

    fn backend_type(&self) -> &'static str {
        "JSONL"
    }
}

pub fn create_writer(format: OutputFormat, path: &Path) -> Result<Box<dyn WriterBackend>, WriterError> {
    let writer: Box<dyn WriterBackend> = match format {
        OutputFormat::Csv => Box::new(CsvWriter::new(path)?),
        OutputFormat::Jsonl => Box::new(JsonlWriter::new(path)?),
    };
    Ok(writer)
}
