//! Property tests: replay is independent of how the stream is chunked.

use proptest::prelude::*;

use keri_kernel::{Kel, KeyState};
use keri_kernel_testkit::fixtures::TestController;
use keri_kernel_testkit::generators::{anchors, chunked_source, cut_points};

fn build_log(seed: u8, data: Vec<serde_json::Value>) -> (Vec<u8>, KeyState) {
    let mut controller = TestController::new(seed);
    controller.incept();
    controller.interact(data);
    controller.rotate();
    controller.interact(vec![]);
    (controller.stream(), controller.state().clone())
}

fn replay(stream: &[u8], cuts: &[usize]) -> Kel {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .build()
        .unwrap();
    runtime.block_on(async {
        let mut kel = Kel::new();
        kel.replay(chunked_source(stream, cuts)).await.unwrap();
        kel
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn prop_replay_chunk_invariant(
        seed in 1u8..200,
        data in anchors(),
        cuts in cut_points(2048),
    ) {
        let (stream, expected) = build_log(seed, data);
        let kel = replay(&stream, &cuts);

        prop_assert_eq!(kel.len(), 4);
        prop_assert_eq!(&kel.state().d, &expected.d);
        prop_assert_eq!(&kel.state().k, &expected.k);
        prop_assert_eq!(&kel.state().n, &expected.n);
    }

    #[test]
    fn prop_replay_round_trips(seed in 1u8..200) {
        let (stream, _) = build_log(seed, vec![]);
        let kel = replay(&stream, &[]);
        prop_assert_eq!(kel.to_cesr().unwrap(), stream);
    }
}
