use common::store::{CsvRecordStore, DEFI_FILE, NETWORTH_FILE, STATS_FILE, TOKENS_FILE};

#[test]
fn loads_all_tables_from_directory() {
    let tmp = tempfile::tempdir().unwrap();
    let dir = tmp.path();
    std::fs::write(
        dir.join(NETWORTH_FILE),
        "wallet,chain,native_balance,native_balance_usd,token_balance_usd,chain_networth_usd,total_networth_usd\n\
         0xaaa,eth,1.5,3000,1200,4200,4200\n\
         0xaaa,polygon,10,8,0,8,4200\n\
         0xbbb,eth,0,0,0,0,0\n",
    )
    .unwrap();
    std::fs::write(
        dir.join(TOKENS_FILE),
        "wallet,token_symbol,usd_value\n0xaaa,ETH,3000\n0xaaa,USDC,1200\n",
    )
    .unwrap();
    std::fs::write(
        dir.join(DEFI_FILE),
        "wallet,protocol_name,usd_value\n0xaaa,Aave,250.5\n",
    )
    .unwrap();
    std::fs::write(
        dir.join(STATS_FILE),
        "wallet,nfts,collections,transactions_total,nft_transfers_total,token_transfers_total\n\
         0xaaa,4,2,120,3,80\n",
    )
    .unwrap();

    let snapshot = CsvRecordStore::new(dir).load().unwrap();
    assert_eq!(snapshot.wallet_count(), 2);
    assert_eq!(
        snapshot.networth_for("0xaaa").unwrap().chain.as_deref(),
        Some("eth")
    );
    assert_eq!(snapshot.tokens_for("0xaaa").count(), 2);
    assert_eq!(snapshot.defi_for("0xaaa").count(), 1);
    assert!(snapshot.nfts.is_empty());
    assert_eq!(snapshot.stats_for("0xaaa").unwrap().collections, Some(2));
    assert!(snapshot.stats_for("0xbbb").is_none());
}
