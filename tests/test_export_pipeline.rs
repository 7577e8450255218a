//! End-to-end export tests: in-memory pages through classification,
//! aggregation and the CSV writer.

#[cfg(test)]
mod export_pipeline_tests {
    use async_trait::async_trait;
    use serde_json::{json, Value};
    use solexport::export_core::helius_client::FetchError;
    use solexport::export_core::output_writer::CsvWriter;
    use solexport::export_core::types::SOL_MINT;
    use solexport::export_core::{export_transactions, ExportError, ExportSummary, TransactionSource};
    use std::collections::VecDeque;

    const WALLET: &str = "8cRrU1NzNpjL3k2BwjW3VixAcX6VFc29KHr4KZg8cs2Y";
    const POOL: &str = "9WzDXwBbmkg8ZTbNMqUxvQRAyrZzDsGYdLVL9zYtAWWM";
    const TOKEN_A: &str = "EPjFWdd5AufqSSqeM2qN1xzybapC8G4wEGGkZwyTDt1v";
    const TOKEN_B: &str = "DezXAZ8z7PnrnRJjz3wXBoRgixCa6xjnB7YaB1pPB263";

    struct StaticPages {
        pages: VecDeque<Vec<Value>>,
        fail_after: bool,
    }

    impl StaticPages {
        fn new(pages: Vec<Vec<Value>>) -> Self {
            Self {
                pages: pages.into(),
                fail_after: false,
            }
        }
    }

    #[async_trait]
    impl TransactionSource for StaticPages {
        async fn next_page(&mut self) -> Result<Option<Vec<Value>>, FetchError> {
            match self.pages.pop_front() {
                Some(page) => Ok(Some(page)),
                None if self.fail_after => Err(FetchError::RetriesExhausted {
                    attempts: 5,
                    last_error: "rate limited (429 Too Many Requests)".to_string(),
                }),
                None => Ok(None),
            }
        }
    }

    fn swap_tx() -> Value {
        json!({
            "signature": "swapSig",
            "timestamp": 1700000000,
            "fee": 5000,
            "feePayer": WALLET,
            "type": "SWAP",
            "tokenTransfers": [
                {"fromUserAccount": WALLET, "toUserAccount": POOL, "mint": TOKEN_A,
                 "rawTokenAmount": {"tokenAmount": "2000000", "decimals": 6}},
                {"fromUserAccount": POOL, "toUserAccount": WALLET, "mint": TOKEN_B,
                 "rawTokenAmount": {"tokenAmount": "100000", "decimals": 3}}
            ]
        })
    }

    fn double_receive_tx() -> Value {
        json!({
            "signature": "recvSig",
            "timestamp": 1700000060,
            "fee": 5000,
            "feePayer": POOL,
            "tokenTransfers": [
                {"fromUserAccount": POOL, "toUserAccount": WALLET, "mint": TOKEN_A, "tokenAmount": 5.0},
                {"fromUserAccount": POOL, "toUserAccount": WALLET, "mint": TOKEN_A, "tokenAmount": 3.0}
            ]
        })
    }

    fn fee_only_tx() -> Value {
        json!({
            "signature": "feeSig",
            "timestamp": 1700000120,
            "fee": 5000,
            "feePayer": WALLET,
            "nativeTransfers": [],
            "tokenTransfers": []
        })
    }

    fn native_send_tx() -> Value {
        json!({
            "signature": "solSig",
            "timestamp": 1700000180,
            "fee": 5000,
            "feePayer": WALLET,
            "nativeTransfers": [
                {"fromUserAccount": WALLET, "toUserAccount": POOL, "amount": 1_250_000_000u64}
            ]
        })
    }

    fn malformed_tx() -> Value {
        json!({"signature": "brokenSig", "fee": 5000})
    }

    fn read_rows(path: &std::path::Path) -> Vec<Vec<String>> {
        let mut reader = csv::Reader::from_path(path).unwrap();
        reader
            .records()
            .map(|r| r.unwrap().iter().map(str::to_string).collect())
            .collect()
    }

    #[tokio::test]
    async fn test_export_writes_one_row_per_valid_transaction() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("transactions.csv");

        let mut source = StaticPages::new(vec![
            vec![swap_tx(), double_receive_tx(), malformed_tx()],
            vec![fee_only_tx(), native_send_tx()],
        ]);
        let mut writer = CsvWriter::new(&path).unwrap();
        let mut summary = ExportSummary::default();

        export_transactions(&mut source, &mut writer, WALLET, &mut summary)
            .await
            .unwrap();

        assert_eq!(summary.pages, 2);
        assert_eq!(summary.transactions, 5);
        assert_eq!(summary.skipped, 1);
        assert_eq!(summary.rows_written, summary.transactions - summary.skipped);

        let rows = read_rows(&path);
        assert_eq!(rows.len(), 4);

        // Swap: 2 tokenA out, 100 tokenB in, fee in SOL
        assert_eq!(
            rows[0],
            vec![
                "2023-11-14 22:13:20", "swapSig", WALLET, POOL, "2", TOKEN_A, "100", TOKEN_B, "0.000005", "SOL"
            ]
        );

        // Same mint received twice is summed; fee paid by someone else
        assert_eq!(rows[1][1], "recvSig");
        assert_eq!(rows[1][2], POOL);
        assert_eq!(rows[1][3], WALLET);
        assert_eq!(rows[1][6], "8");
        assert_eq!(rows[1][7], TOKEN_A);
        assert_eq!(rows[1][8], "0");

        // Fee-only still produces a row
        assert_eq!(rows[2][1], "feeSig");
        assert_eq!(rows[2][4], "0");
        assert_eq!(rows[2][5], "");
        assert_eq!(rows[2][6], "0");
        assert_eq!(rows[2][7], "");
        assert_eq!(rows[2][8], "0.000005");
        assert_eq!(rows[2][9], "SOL");

        // Native SOL uses the sentinel mint
        assert_eq!(rows[3][4], "1.25");
        assert_eq!(rows[3][5], SOL_MINT);
    }

    #[tokio::test]
    async fn test_fetch_failure_is_fatal_but_keeps_written_rows() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("transactions.csv");

        let mut source = StaticPages::new(vec![vec![swap_tx()]]);
        source.fail_after = true;
        let mut writer = CsvWriter::new(&path).unwrap();
        let mut summary = ExportSummary::default();

        let err = export_transactions(&mut source, &mut writer, WALLET, &mut summary)
            .await
            .unwrap_err();
        assert!(matches!(err, ExportError::Fetch(FetchError::RetriesExhausted { .. })));
        assert_eq!(summary.rows_written, 1);
    }

    #[tokio::test]
    async fn test_transfer_without_accounts_is_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("transactions.csv");

        let no_accounts = json!({
            "signature": "orphanSig",
            "timestamp": 1700000000,
            "fee": 5000,
            "feePayer": WALLET,
            "tokenTransfers": [{"mint": TOKEN_A, "tokenAmount": 1.0}]
        });
        let mut source = StaticPages::new(vec![vec![no_accounts, native_send_tx()]]);
        let mut writer = CsvWriter::new(&path).unwrap();
        let mut summary = ExportSummary::default();

        export_transactions(&mut source, &mut writer, WALLET, &mut summary)
            .await
            .unwrap();

        assert_eq!(summary.skipped, 1);
        assert_eq!(summary.rows_written, 1);
        let rows = read_rows(&path);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0][1], "solSig");
    }

    #[tokio::test]
    async fn test_empty_history_writes_header_only() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.csv");

        let mut source = StaticPages::new(vec![]);
        let mut writer = CsvWriter::new(&path).unwrap();
        let mut summary = ExportSummary::default();

        export_transactions(&mut source, &mut writer, WALLET, &mut summary)
            .await
            .unwrap();

        assert_eq!(summary, ExportSummary::default());
        let contents = std::fs::read_to_string(&path).unwrap();
        assert_eq!(contents.lines().count(), 1);
        assert!(contents.starts_with("Date,TxHash,TxSrc,TxDest"));
    }
}
