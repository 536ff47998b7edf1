// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Proteus-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Proteus and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use std::collections::BTreeMap;
use std::sync::Arc;

use criterion::{black_box, criterion_group, criterion_main, BatchSize, Criterion};

use proteus::manager::DraftManager;
use proteus::model::{natural_key_from_title, DraftPatch, FieldValue, SubRecord};
use proteus::store::{DraftStore, MemoryMedium, MemorySlot};

fn runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .build()
        .expect("current-thread runtime")
}

fn memory_manager() -> DraftManager {
    let store = DraftStore::new(Arc::new(MemoryMedium::new()), Arc::new(MemorySlot::new()));
    DraftManager::new(store)
}

fn patch(title: &str) -> DraftPatch {
    let mut fields = BTreeMap::new();
    fields.insert("title".to_owned(), FieldValue::Text(title.to_owned()));
    fields.insert(
        "description".to_owned(),
        FieldValue::RichText("<p>Own the billing stack end to end.</p>".to_owned()),
    );
    fields.insert("headcount".to_owned(), FieldValue::Number(3.0));
    fields.insert(
        "salary_bands".to_owned(),
        FieldValue::Rows(
            (0..4)
                .map(|band| {
                    SubRecord::fresh(BTreeMap::from([(
                        "level".to_owned(),
                        FieldValue::Text(format!("L{band}")),
                    )]))
                })
                .collect(),
        ),
    );
    DraftPatch {
        draft_id: None,
        natural_key: natural_key_from_title(title),
        fields,
        attachments: BTreeMap::new(),
    }
}

fn full_manager(rt: &tokio::runtime::Runtime) -> DraftManager {
    let mut manager = memory_manager();
    rt.block_on(async {
        for n in 0..manager.capacity() {
            manager.upsert(patch(&format!("Role {n}"))).await;
        }
    });
    manager
}

// Benchmark identity (keep stable):
// - Group name in this file: `manager.upsert`
// - Case IDs (the string after the `/`) must remain stable across refactors so
//   results stay comparable over time (e.g. `append_empty`, `rekey_full`).
// - If implementations move/deduplicate, update the wiring but do not rename
//   group or case IDs.
fn benches_manager(c: &mut Criterion) {
    let rt = runtime();
    let mut group = c.benchmark_group("manager.upsert");

    group.bench_function("append_empty", |b| {
        b.iter_batched_ref(
            memory_manager,
            |manager| {
                let id = rt.block_on(manager.upsert(black_box(patch("Backend Engineer"))));
                black_box(id)
            },
            BatchSize::SmallInput,
        )
    });

    group.bench_function("rekey_full", |b| {
        b.iter_batched_ref(
            || full_manager(&rt),
            |manager| {
                // Key match against a full list, then eviction check.
                let id = rt.block_on(manager.upsert(black_box(patch("Role 7"))));
                black_box(id)
            },
            BatchSize::SmallInput,
        )
    });

    group.bench_function("evict_over_capacity", |b| {
        b.iter_batched_ref(
            || full_manager(&rt),
            |manager| {
                let id = rt.block_on(manager.upsert(black_box(patch("One Role Too Many"))));
                black_box(id)
            },
            BatchSize::SmallInput,
        )
    });

    group.finish();
}

criterion_group!(benches, benches_manager);
criterion_main!(benches);
