#![allow(dead_code)]

use neurograph::prelude::*;

#[derive(Default, Debug, Clone, PartialEq)]
pub struct Neuron {
    pub potential: f32,
    pub threshold: f64,
    pub name: FixedString<16>,
    pub scratch: i32,
}

impl Described for Neuron {
    const TYPE_NAME: &'static str = "Neuron";

    fn describe() -> Vec<FieldDescriptor> {
        vec![
            FieldDescriptor::values(
                "potential",
                |n: &Neuron| &n.potential,
                |n: &mut Neuron| &mut n.potential,
            )
            .state(),
            FieldDescriptor::values(
                "threshold",
                |n: &Neuron| &n.threshold,
                |n: &mut Neuron| &mut n.threshold,
            ),
            FieldDescriptor::text(
                "name",
                |n: &Neuron| &n.name,
                |n: &mut Neuron| &mut n.name,
            )
            .init(),
            FieldDescriptor::values(
                "scratch",
                |n: &Neuron| &n.scratch,
                |n: &mut Neuron| &mut n.scratch,
            )
            .skip(),
        ]
    }
}

#[derive(Default, Debug)]
pub struct Synapse {
    pub weight: f32,
    pub pre: Option<Link>,
    pub post: Option<Link>,
}

impl Described for Synapse {
    const TYPE_NAME: &'static str = "Synapse";

    fn describe() -> Vec<FieldDescriptor> {
        vec![
            FieldDescriptor::values(
                "weight",
                |s: &Synapse| &s.weight,
                |s: &mut Synapse| &mut s.weight,
            ),
            FieldDescriptor::reference(
                "pre",
                ReferenceMode::Direct,
                |s: &Synapse| &s.pre,
                |s: &mut Synapse| &mut s.pre,
            ),
            FieldDescriptor::reference(
                "post",
                ReferenceMode::Direct,
                |s: &Synapse| &s.post,
                |s: &mut Synapse| &mut s.post,
            ),
        ]
    }
}

#[derive(Default, Debug)]
pub struct Area {
    pub title: String,
    pub members: Buffer<Option<Link>>,
    pub gain: [[f32; 2]; 3],
}

impl Described for Area {
    const TYPE_NAME: &'static str = "Area";

    fn describe() -> Vec<FieldDescriptor> {
        vec![
            FieldDescriptor::text("title", |a: &Area| &a.title, |a: &mut Area| &mut a.title),
            FieldDescriptor::reference(
                "members",
                ReferenceMode::Direct,
                |a: &Area| &a.members,
                |a: &mut Area| &mut a.members,
            ),
            FieldDescriptor::values("gain", |a: &Area| &a.gain, |a: &mut Area| &mut a.gain),
        ]
    }
}

#[derive(Default, Debug)]
pub struct Network {
    pub description: Option<String>,
    pub neurons_count: i32,
    pub neurons: Pool<Neuron>,
    pub synapses: Pool<Synapse>,
    pub areas: Pool<Area>,
    pub traces: PointerTable<Buffer<f32>>,
    pub monitors: [Option<Link>; 2],
}

impl Described for Network {
    const TYPE_NAME: &'static str = "Network";

    fn describe() -> Vec<FieldDescriptor> {
        vec![
            FieldDescriptor::text(
                "description",
                |n: &Network| &n.description,
                |n: &mut Network| &mut n.description,
            ),
            FieldDescriptor::values(
                "neurons_count",
                |n: &Network| &n.neurons_count,
                |n: &mut Network| &mut n.neurons_count,
            )
            .state(),
            FieldDescriptor::records(
                "neurons",
                |n: &Network| &n.neurons,
                |n: &mut Network| &mut n.neurons,
            )
            .tag_target()
            .state(),
            FieldDescriptor::records(
                "synapses",
                |n: &Network| &n.synapses,
                |n: &mut Network| &mut n.synapses,
            ),
            FieldDescriptor::records(
                "areas",
                |n: &Network| &n.areas,
                |n: &mut Network| &mut n.areas,
            ),
            FieldDescriptor::pointers(
                "traces",
                |n: &Network| &n.traces,
                |n: &mut Network| &mut n.traces,
            )
            .tag_target(),
            FieldDescriptor::reference(
                "monitors",
                ReferenceMode::Indirect,
                |n: &Network| &n.monitors,
                |n: &mut Network| &mut n.monitors,
            ),
        ]
    }
}

pub fn registry() -> SchemaRegistry {
    let registry = SchemaRegistry::new()
        .with::<Neuron>()
        .and_then(|r| r.with::<Synapse>())
        .and_then(|r| r.with::<Area>())
        .and_then(|r| r.with::<Network>())
        .unwrap();
    registry.validate().unwrap();
    registry
}

pub fn neuron(potential: f32, threshold: f64, name: &str) -> Neuron {
    Neuron {
        potential,
        threshold,
        name: FixedString::new(name),
        scratch: 7,
    }
}

/// Four neurons, three synapses (two sharing a presynaptic neuron), two areas and a
/// trace table with a null middle entry watched twice.
pub fn network() -> Network {
    let mut net = Network {
        description: Some("two layer test net".to_string()),
        ..Network::default()
    };
    net.neurons.push(neuron(-70.0, -55.0, "n0"));
    net.neurons.push(neuron(-65.5, -50.25, "n1"));
    net.neurons.push(neuron(-80.125, -52.0, "n2"));
    net.neurons.push(neuron(-60.0, 0.1, "n3"));
    net.neurons_count = net.neurons.len() as i32;

    net.synapses.push(Synapse {
        weight: 0.5,
        pre: net.neurons.link(0),
        post: net.neurons.link(2),
    });
    net.synapses.push(Synapse {
        weight: -0.25,
        pre: net.neurons.link(0),
        post: net.neurons.link(3),
    });
    net.synapses.push(Synapse {
        weight: 1.0,
        pre: None,
        post: net.neurons.link(1),
    });

    net.areas.push(Area {
        title: "input".to_string(),
        members: Buffer::from(vec![net.neurons.link(0), net.neurons.link(1)]),
        gain: [[1.0, 0.5], [0.25, 0.0], [2.0, -1.0]],
    });
    net.areas.push(Area {
        title: "output layer".to_string(),
        members: Buffer::new(),
        gain: Default::default(),
    });

    net.traces = PointerTable::from(vec![
        Some(Buffer::from(vec![0.5, 1.5, 2.5])),
        None,
        Some(Buffer::from(vec![-1.0])),
    ]);
    net.monitors = [
        net.traces.get(0).and_then(|trace| trace.link(2)),
        net.traces.get(2).and_then(|trace| trace.link(0)),
    ];
    net
}

/// Position of the neuron a direct link points at, if it points into `net.neurons`.
pub fn neuron_index(net: &Network, link: Option<Link>) -> Option<usize> {
    link.filter(|link| net.neurons.owns(link)).map(|link| link.index)
}

/// `(pointee, element)` of a monitor link inside `net.traces`.
pub fn trace_position(net: &Network, link: Option<Link>) -> Option<(usize, usize)> {
    let link = link?;
    net.traces.locate(&link).map(|pointee| (pointee, link.index))
}

pub fn save_text(registry: &SchemaRegistry, net: &Network, mode: SelectionMode) -> String {
    let mut out = Vec::new();
    write_model(registry, "Network", net, &mut out, &DocumentHeader::default(), mode).unwrap();
    String::from_utf8(out).unwrap()
}

pub fn load_text(
    registry: &SchemaRegistry,
    text: &str,
    policy: LoadPolicy,
) -> Result<(Network, LoadSummary), DocumentError> {
    let mut net = Network::default();
    let summary = read_model(
        registry,
        text.as_bytes(),
        "Network",
        &mut net,
        false,
        &DocumentHeader::default(),
        policy,
    )?;
    Ok((net, summary))
}

/// Checks everything a save in `SelectionMode::All` carries, links compared by position.
pub fn assert_same_network(expected: &Network, actual: &Network) {
    assert_eq!(actual.description, expected.description);
    assert_eq!(actual.neurons_count, expected.neurons_count);
    assert_eq!(actual.neurons.len(), expected.neurons.len());
    for (a, e) in actual.neurons.iter().zip(expected.neurons.iter()) {
        assert_eq!(a.potential, e.potential);
        assert_eq!(a.threshold, e.threshold);
        assert_eq!(a.name, e.name);
        assert_eq!(a.scratch, 0, "skipped fields are not persisted");
    }

    assert_eq!(actual.synapses.len(), expected.synapses.len());
    for (a, e) in actual.synapses.iter().zip(expected.synapses.iter()) {
        assert_eq!(a.weight, e.weight);
        assert_eq!(neuron_index(actual, a.pre), neuron_index(expected, e.pre));
        assert_eq!(neuron_index(actual, a.post), neuron_index(expected, e.post));
        assert_eq!(a.pre.is_some(), e.pre.is_some());
    }

    assert_eq!(actual.areas.len(), expected.areas.len());
    for (a, e) in actual.areas.iter().zip(expected.areas.iter()) {
        assert_eq!(a.title, e.title);
        assert_eq!(a.gain, e.gain);
        assert_eq!(a.members.len(), e.members.len());
        for (am, em) in a.members.iter().zip(e.members.iter()) {
            assert_eq!(neuron_index(actual, *am), neuron_index(expected, *em));
        }
    }

    assert_eq!(actual.traces, expected.traces);
    for (a, e) in actual.monitors.iter().zip(expected.monitors.iter()) {
        assert_eq!(trace_position(actual, *a), trace_position(expected, *e));
    }
}
