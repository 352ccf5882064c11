use common::Money;
use criterion::{Criterion, criterion_group, criterion_main};
use ledger::{Account, EntryQuery, InMemoryLedgerStore, Ledger, Posting, ReferenceType};

fn receipt(reference_id: &str) -> Posting {
    Posting::new(
        Account::Cash,
        Account::Revenue,
        Money::from_minor(10_000),
        ReferenceType::Payment,
        reference_id,
        "payment receipt",
    )
}

fn bench_record_double_entry(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();

    c.bench_function("ledger/record_double_entry", |b| {
        b.iter(|| {
            rt.block_on(async {
                let ledger = Ledger::new(InMemoryLedgerStore::new());
                ledger.record_double_entry(receipt("bench")).await.unwrap();
            });
        });
    });
}

fn bench_solvency_over_journal(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let ledger = Ledger::new(InMemoryLedgerStore::new());
    rt.block_on(async {
        for i in 0..1_000 {
            ledger
                .record_double_entry(receipt(&format!("p-{i}")))
                .await
                .unwrap();
        }
    });

    c.bench_function("ledger/calculate_solvency_1k_entries", |b| {
        b.iter(|| {
            rt.block_on(async {
                ledger.calculate_solvency().await.unwrap();
            });
        });
    });
}

fn bench_audit_query(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let ledger = Ledger::new(InMemoryLedgerStore::new());
    rt.block_on(async {
        for i in 0..1_000 {
            ledger
                .record_double_entry(receipt(&format!("p-{i}")))
                .await
                .unwrap();
        }
    });

    c.bench_function("ledger/get_entries_by_account", |b| {
        b.iter(|| {
            rt.block_on(async {
                ledger
                    .get_entries(EntryQuery::for_account(Account::Cash).limit(100))
                    .await
                    .unwrap();
            });
        });
    });
}

criterion_group!(
    benches,
    bench_record_double_entry,
    bench_solvency_over_journal,
    bench_audit_query
);
criterion_main!(benches);
