//! Fuzz target: snapshot decode + reconcile
//!
//! Whatever bytes sit in the cache file, a decoded snapshot reconciled to
//! the layout must have exactly the configured channel counts.
//!
//! cargo fuzz run fuzz_snapshot_decode

#![no_main]

use distio::io::state::{ChannelLayout, Snapshot};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let layout = ChannelLayout {
        inputs: 4,
        outputs: 6,
        default_pullup: false,
    };
    if let Ok(snapshot) = serde_json::from_slice::<Snapshot>(data) {
        let fitted = snapshot.reconcile(layout);
        assert_eq!(fitted.inputs.len(), layout.inputs);
        assert_eq!(fitted.outputs.len(), layout.outputs);
    }
});
