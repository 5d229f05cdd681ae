mod common;

use common::{compute_program, slot, GpuState};
use liverpool_gpu::test_utils::{BufferSharpBuilder, ImageSharpBuilder, SamplerSharpBuilder};
use liverpool_gpu::{DataFormat, NumberFormat};
use liverpool_shader::{BufferResource, ImageResource, Info, SamplerResource, StageSpecialization};
use proptest::prelude::*;

/// What is bound to each slot of [`props_program`] for one draw.
#[derive(Clone, Debug)]
struct Bound {
    buffers: [Option<(u32, u32)>; 3],
    image: Option<NumberFormat>,
    unnormalized: bool,
}

fn props_program() -> Info {
    let mut info = compute_program();
    info.buffers.push(BufferResource::at(slot(0)));
    info.buffers.push(BufferResource::at(slot(1)).written());
    info.buffers.push(BufferResource::at(slot(2)));
    info.images.push(ImageResource::at(slot(3)));
    info.samplers.push(SamplerResource::at(slot(4)));
    info
}

fn buffer_binding() -> impl Strategy<Value = (u32, u32)> {
    (prop_oneof![Just(0u32), Just(4), Just(16)], 1u32..8)
}

fn image_format() -> impl Strategy<Value = NumberFormat> {
    prop_oneof![
        Just(NumberFormat::Unorm),
        Just(NumberFormat::Uint),
        Just(NumberFormat::Uscaled),
    ]
}

fn bound() -> impl Strategy<Value = Bound> {
    (
        proptest::array::uniform3(proptest::option::of(buffer_binding())),
        proptest::option::of(image_format()),
        any::<bool>(),
    )
        .prop_map(|(buffers, image, unnormalized)| Bound {
            buffers,
            image,
            unnormalized,
        })
}

fn fully_bound() -> impl Strategy<Value = Bound> {
    (
        proptest::array::uniform3(buffer_binding()),
        image_format(),
        any::<bool>(),
    )
        .prop_map(|(buffers, image, unnormalized)| Bound {
            buffers: buffers.map(Some),
            image: Some(image),
            unnormalized,
        })
}

fn specialize(info: &Info, bound: &Bound) -> StageSpecialization {
    let mut state = GpuState::new();
    for (index, buffer) in bound.buffers.iter().enumerate() {
        if let Some((stride, records)) = *buffer {
            state.bind(
                index as u16,
                &BufferSharpBuilder::new(0x8000, stride, records).dwords(),
            );
        }
    }
    if let Some(num_format) = bound.image {
        state.bind(
            3,
            &ImageSharpBuilder::new(0x1_0000, 8, 8)
                .format(DataFormat::Format8_8_8_8, num_format)
                .dwords(),
        );
    }
    state.bind(
        4,
        &SamplerSharpBuilder::new()
            .force_unnormalized(bound.unnormalized)
            .dwords(),
    );
    state.specialize(info)
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 256,
        .. ProptestConfig::default()
    })]

    #[test]
    fn every_specialization_matches_itself(bound in bound()) {
        let spec = specialize(&props_program(), &bound);
        prop_assert!(spec.matches(&spec));
        prop_assert!(spec.matches(&spec.clone()));
    }

    #[test]
    fn matching_specializations_share_a_bucket(a in bound(), b in bound()) {
        let info = props_program();
        let a = specialize(&info, &a);
        let b = specialize(&info, &b);
        if a.matches(&b) || b.matches(&a) {
            prop_assert_eq!(a.bucket_hash(), b.bucket_hash());
        }
    }

    #[test]
    fn fully_bound_specializations_match_symmetrically(a in fully_bound(), b in fully_bound()) {
        let info = props_program();
        let a = specialize(&info, &a);
        let b = specialize(&info, &b);
        prop_assert_eq!(a.matches(&b), b.matches(&a));
    }

    #[test]
    fn binding_more_never_loosens_a_match(a in bound(), extra in bound()) {
        // `wider` binds everything `a` binds, plus whatever `extra` adds in a's empty slots.
        let mut wider = a.clone();
        for (slot, more) in wider.buffers.iter_mut().zip(extra.buffers) {
            if slot.is_none() {
                *slot = more;
            }
        }
        if wider.image.is_none() {
            wider.image = extra.image;
        }

        let info = props_program();
        let narrow = specialize(&info, &a);
        let wide = specialize(&info, &wider);
        // A module compiled for the wider binding set is valid wherever the narrow one is used.
        prop_assert!(wide.matches(&narrow));
    }
}
