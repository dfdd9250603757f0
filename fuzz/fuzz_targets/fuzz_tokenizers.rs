#![no_main]

use libfuzzer_sys::fuzz_target;
use nidx::tokenize::{ClassificationTable, TokenizerKind};
use std::sync::Arc;

fuzz_target!(|data: &[u8]| {
    // Every strategy must find the same tokens in arbitrary bytes
    let table = Arc::new(ClassificationTable::alphanumeric());
    let mut expected: Option<Vec<Vec<u8>>> = None;

    for kind in TokenizerKind::ALL {
        let mut buf = data.to_vec();
        let tokens = kind.build(Arc::clone(&table)).tokenize(&mut buf);
        let texts: Vec<Vec<u8>> = tokens.texts(&buf).into_iter().map(<[u8]>::to_vec).collect();

        match &expected {
            Some(e) => assert_eq!(e, &texts, "{} disagrees", kind),
            None => expected = Some(texts),
        }
    }
});
