mod common;

use common::*;
use neurograph::prelude::*;

const DAMAGED: &str = "neurograph-model 1
neurons_count 2
neurons t0
neurons 0
potential -1.0e0
mood 3

synapses 0
weight 2.0e0


synapses 0
pre d0 5


";

#[test]
fn test_lenient_load_repairs_and_reports() {
    let registry = registry();
    let (net, summary) = load_text(&registry, DAMAGED, LoadPolicy::Lenient).unwrap();

    assert_eq!(net.neurons.len(), 2);
    assert_eq!(net.neurons[0].potential, -1.0);
    assert_eq!(net.synapses.len(), 1);
    assert_eq!(net.synapses[0].weight, 2.0);
    // clamped to the first neuron
    assert_eq!(neuron_index(&net, net.synapses[0].pre), Some(0));
    assert_eq!(net.synapses[0].post, None);

    assert!(matches!(
        summary.warnings.as_slice(),
        [
            LoadWarning::UnknownField { line: 6, .. },
            LoadWarning::IndexOutOfRange { line: 13, index: 5, len: 2, .. },
        ]
    ));
}

#[test]
fn test_strict_load_rejects_the_same_document() {
    let registry = registry();
    let err = load_text(&registry, DAMAGED, LoadPolicy::Strict).unwrap_err();
    assert!(matches!(
        err,
        DocumentError::Load(LoadError::Rejected(LoadWarning::UnknownField { line: 6, .. }))
    ));
}

#[test]
fn test_line_numbers_count_the_header() {
    let registry = registry();
    let text = "neurograph-model 1\nsynapses 0\n\n\nsynapses 0\npre d4 0\n\n";
    let err = load_text(&registry, text, LoadPolicy::Lenient).unwrap_err();
    assert!(matches!(
        err,
        DocumentError::Load(LoadError::Malformed { line: 6, .. })
    ));
}

#[test]
fn test_monitor_into_null_trace_stays_empty() {
    let registry = registry();
    let text = "neurograph-model 1\ntraces t0\ntraces 2 1.0e0\n\n\nmonitors 1 i0 1 0\n\n";
    let (net, summary) = load_text(&registry, text, LoadPolicy::Lenient).unwrap();
    assert_eq!(net.traces.len(), 3);
    assert_eq!(net.monitors, [None, None]);
    assert!(matches!(
        summary.warnings.as_slice(),
        [LoadWarning::NullPointee { pointee: 1, .. }]
    ));
}
