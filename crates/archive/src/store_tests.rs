// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[tokio::test]
async fn put_creates_parents_and_writes() {
    let dir = tempfile::tempdir().unwrap();
    let store = FsObjectStore::new(dir.path());

    store
        .put("events/100/sessions/10/laps.json", b"[]")
        .await
        .unwrap();

    let written = std::fs::read(dir.path().join("events/100/sessions/10/laps.json")).unwrap();
    assert_eq!(written, b"[]");
}

#[tokio::test]
async fn put_overwrites_atomically() {
    let dir = tempfile::tempdir().unwrap();
    let store = FsObjectStore::new(dir.path());

    store.put("events/100/event.json", b"v1").await.unwrap();
    store.put("events/100/event.json", b"v2").await.unwrap();

    let written = std::fs::read(dir.path().join("events/100/event.json")).unwrap();
    assert_eq!(written, b"v2");
    // No temp file left behind
    assert!(!dir.path().join("events/100/event.tmp").exists());
}
