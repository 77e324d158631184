//! Driver enrichment: idempotent assignment and stale-driver sweep.

use crate::prelude::*;
use pw_bus::PatchMessage;
use pw_codecs::StreamEnvelope;
use pw_core::{DriverInfo, EventId};

fn info(car: &str, id: &str, name: &str) -> DriverInfo {
    DriverInfo {
        event_id: EventId::new(1),
        car_number: car.to_string(),
        transponder_id: 0,
        driver_id: id.to_string(),
        driver_name: name.to_string(),
    }
}

#[tokio::test]
async fn identical_driver_info_emits_no_second_patch() {
    let mut f = fixture(1);
    f.pipeline.handle(session_change(10, "Race")).await.unwrap();
    f.pipeline
        .handle(rmon(10, "$A,\"42\",\"42\",52474,\"A\",\"B\",\"USA\",1"))
        .await
        .unwrap();

    f.pipeline
        .handle(StreamEnvelope::DriverInfo(info("42", "D1", "A")))
        .await
        .unwrap();
    let after_first = f.sink.messages().len();

    f.pipeline
        .handle(StreamEnvelope::DriverInfo(info("42", "D1", "A")))
        .await
        .unwrap();
    assert_eq!(f.sink.messages().len(), after_first);
}

#[tokio::test]
async fn sweep_clears_driver_with_no_cache_entry() {
    let mut f = fixture(1);
    f.pipeline.handle(session_change(10, "Race")).await.unwrap();
    f.pipeline
        .handle(rmon(10, "$A,\"7\",\"7\",52001,\"A\",\"B\",\"USA\",1"))
        .await
        .unwrap();

    // Driver assigned, then the identity system forgets the car
    f.pipeline
        .handle(StreamEnvelope::DriverInfo(info("7", "D9", "Old")))
        .await
        .unwrap();
    f.pipeline.sweep_tick().await.unwrap();

    let messages = f.sink.messages();
    let PatchMessage::Cars { patches, .. } = messages.last().unwrap() else {
        panic!("expected car patches");
    };
    assert_eq!(patches[0].number, "7");
    assert_eq!(patches[0].driver_id, Some(String::new()));
    assert_eq!(patches[0].driver_name, Some(String::new()));
}

#[tokio::test]
async fn sweep_spares_cars_still_in_the_cache() {
    let mut f = fixture(1);
    f.pipeline.handle(session_change(10, "Race")).await.unwrap();
    f.pipeline
        .handle(rmon(10, "$A,\"42\",\"42\",52474,\"A\",\"B\",\"USA\",1"))
        .await
        .unwrap();

    let driver = info("42", "D1", "A");
    f.caches.put_driver(EventId::new(1), driver.clone());
    f.pipeline
        .handle(StreamEnvelope::DriverInfo(driver))
        .await
        .unwrap();

    let before = f.sink.messages().len();
    f.pipeline.sweep_tick().await.unwrap();
    assert_eq!(f.sink.messages().len(), before);
    assert_eq!(
        f.pipeline.state().read(|s| s.car("42").unwrap().driver_id.clone()),
        "D1"
    );
}
