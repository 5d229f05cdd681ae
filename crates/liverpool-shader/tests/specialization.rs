mod common;

use common::{compute_program, program, slot, GpuState, MEMORY_BASE};
use liverpool_gpu::test_utils::{BufferSharpBuilder, ImageSharpBuilder, SamplerSharpBuilder};
use liverpool_gpu::{
    CompMapping, CompSwizzle, DataFormat, ImageType, NumberConversion, NumberFormat,
};
use liverpool_shader::{
    BindingMask, BufferResource, ExportRuntimeInfo, FMaskResource, HullRuntimeInfo, ImageResource,
    ImageSpecialization, InstanceIdType, LogicalStage, Profile, ProfileFeatures, RuntimeInfo,
    SamplerResource, SharpLocation, SpecializationBuilder, SpecializationError, Stage,
    StageRuntimeInfo, TessConstantsLocation, TextureBufferResource, VertexRuntimeInfo,
    MAX_STAGE_RESOURCES,
};
use pretty_assertions::assert_eq;

fn mask_bits(mask: BindingMask) -> Vec<u32> {
    mask.iter().collect()
}

fn two_buffer_program() -> liverpool_shader::Info {
    let mut info = compute_program();
    info.buffers.push(BufferResource::at(slot(0)));
    info.buffers.push(BufferResource::at(slot(1)));
    info
}

#[test]
fn two_buffer_scenario() {
    common::init_tracing();
    let info = two_buffer_program();

    let mut state = GpuState::new();
    state.bind(0, &BufferSharpBuilder::new(0x8000, 16, 4).dwords());
    let s1 = state.specialize(&info);
    let s3 = state.specialize(&info);

    // 32-byte stride, 128 KiB: too large for a uniform binding.
    state.bind(1, &BufferSharpBuilder::new(0x9000, 32, 4096).dwords());
    let s2 = state.specialize(&info);

    assert_eq!(mask_bits(s1.bound), vec![0]);
    assert_eq!(mask_bits(s2.bound), vec![0, 1]);
    assert_eq!(
        (s1.buffers[0].stride, s1.buffers[0].is_storage, s1.buffers[0].size),
        (16, false, 64)
    );
    assert_eq!((s2.buffers[1].stride, s2.buffers[1].is_storage), (32, true));
    // Storage buffers do not record a size.
    assert_eq!(s2.buffers[1].size, 0);

    assert!(!s1.matches(&s2));
    assert!(s1.matches(&s3));
    assert!(s3.matches(&s1));
}

#[test]
fn unbound_slots_keep_lists_aligned() {
    let mut info = two_buffer_program();
    info.images.push(ImageResource::at(slot(2)));
    info.fmasks.push(FMaskResource { location: slot(3) });

    let mut state = GpuState::new();
    state.bind(3, &ImageSharpBuilder::new(0x1_0000, 128, 64).dwords());
    let spec = state.specialize(&info);

    assert_eq!(spec.buffers.len(), 2);
    assert_eq!(spec.images.len(), 1);
    assert_eq!(spec.fmasks.len(), 1);
    // buffers occupy 0..2, the image 2, the fmask 3
    assert_eq!(mask_bits(spec.bound), vec![3]);
    assert_eq!((spec.fmasks[0].width, spec.fmasks[0].height), (128, 64));
    assert_eq!(spec.images[0], ImageSpecialization::default());
}

#[test]
fn specializations_match_themselves() {
    let mut info = two_buffer_program();
    info.texture_buffers.push(TextureBufferResource::at(slot(2)));
    info.images.push(ImageResource::at(slot(3)).written());
    info.samplers.push(SamplerResource::at(slot(4)));

    let mut state = GpuState::new();
    let empty = state.specialize(&info);
    assert!(empty.matches(&empty));

    state
        .bind(0, &BufferSharpBuilder::new(0x8000, 0, 256).dwords())
        .bind(
            2,
            &BufferSharpBuilder::new(0x8000, 4, 64)
                .format(DataFormat::Format32, NumberFormat::Uint)
                .dwords(),
        )
        .bind(3, &ImageSharpBuilder::new(0x1_0000, 16, 16).dwords())
        .bind(4, &SamplerSharpBuilder::new().force_unnormalized(true).dwords());
    let full = state.specialize(&info);
    assert!(full.matches(&full));
    assert_eq!(full.bucket_hash(), full.clone().bucket_hash());
}

#[test]
fn resource_comparison_is_gated_by_the_other_mask() {
    let mut info = compute_program();
    info.images.push(ImageResource::at(slot(0)));

    let mut state = GpuState::new();
    let unbound = state.specialize(&info);

    state.bind(
        0,
        &ImageSharpBuilder::new(0x1_0000, 32, 32)
            .format(DataFormat::Format8_8_8_8, NumberFormat::Uscaled)
            .dwords(),
    );
    let bound = state.specialize(&info);
    assert_eq!(bound.images[0].num_conversion, NumberConversion::UintToUscaled);

    // The bound side's mask gates the comparison.
    assert!(!unbound.matches(&bound));
    assert!(bound.matches(&unbound));
}

#[test]
fn numeric_conversion_of_bound_images_is_compared() {
    let mut info = compute_program();
    info.images.push(ImageResource::at(slot(0)));
    let mut state = GpuState::new();

    state.bind(
        0,
        &ImageSharpBuilder::new(0x1_0000, 32, 32)
            .format(DataFormat::Format8_8_8_8, NumberFormat::Uscaled)
            .dwords(),
    );
    let uscaled = state.specialize(&info);
    state.bind(
        0,
        &ImageSharpBuilder::new(0x1_0000, 32, 32)
            .format(DataFormat::Format8_8_8_8, NumberFormat::Unorm)
            .dwords(),
    );
    let unorm = state.specialize(&info);

    assert!(!uscaled.matches(&unorm));
    assert!(!unorm.matches(&uscaled));
}

#[test]
fn storage_buffer_size_is_ignored() {
    let mut info = compute_program();
    info.buffers.push(BufferResource::at(slot(0)).written());
    let mut state = GpuState::new();

    state.bind(0, &BufferSharpBuilder::new(0x8000, 16, 4).dwords());
    let small = state.specialize(&info);
    state.bind(0, &BufferSharpBuilder::new(0x8000, 16, 400).dwords());
    let large = state.specialize(&info);

    assert!(small.buffers[0].is_storage);
    assert!(small.matches(&large));
    assert!(large.matches(&small));
}

#[test]
fn uniform_buffer_size_is_compared() {
    let mut info = compute_program();
    info.buffers.push(BufferResource::at(slot(0)));
    let mut state = GpuState::new();

    state.bind(0, &BufferSharpBuilder::new(0x8000, 16, 4).dwords());
    let small = state.specialize(&info);
    state.bind(0, &BufferSharpBuilder::new(0x8000, 16, 8).dwords());
    let larger = state.specialize(&info);

    assert!(!small.buffers[0].is_storage);
    assert!(!small.matches(&larger));
    assert!(!larger.matches(&small));
}

#[test]
fn samplers_are_always_compared() {
    let mut info = two_buffer_program();
    info.samplers.push(SamplerResource::at(slot(2)));
    let mut state = GpuState::new();

    state.bind(2, &SamplerSharpBuilder::new().dwords());
    let normalized = state.specialize(&info);
    state.bind(2, &SamplerSharpBuilder::new().force_unnormalized(true).dwords());
    let unnormalized = state.specialize(&info);

    assert_eq!(normalized.bound, BindingMask::EMPTY);
    assert!(!normalized.matches(&unnormalized));
    assert!(!unnormalized.matches(&normalized));
    assert_ne!(normalized.bucket_hash(), unnormalized.bucket_hash());
}

#[test]
fn inline_samplers_and_constant_buffers_are_always_bound() {
    let mut info = compute_program();
    info.buffers.push(BufferResource::inline_cbuf(
        BufferSharpBuilder::new(0x8000, 0, 64).build(),
    ));
    info.samplers.push(SamplerResource::inline(
        SamplerSharpBuilder::new().force_unnormalized(true).build(),
    ));

    let spec = GpuState::new().specialize(&info);
    assert_eq!(mask_bits(spec.bound), vec![0]);
    assert_eq!(spec.buffers[0].size, 64);
    assert!(spec.samplers[0].force_unnormalized);
}

#[test]
fn readconst_reserves_slot_zero() {
    let mut info = two_buffer_program();
    info.has_readconst = true;
    let mut state = GpuState::new();
    state.bind(0, &BufferSharpBuilder::new(0x8000, 16, 4).dwords());

    let with_readconst = state.specialize(&info);
    assert_eq!(mask_bits(with_readconst.bound), vec![1]);
    assert!(with_readconst.has_readconst());

    let plain = state.specialize(&two_buffer_program());
    assert_eq!(mask_bits(plain.bound), vec![0]);
    assert!(!with_readconst.matches(&plain));
    assert!(!plain.matches(&with_readconst));
}

#[test]
fn indirect_sharps_are_read_through_user_data_pointers() {
    let mut info = compute_program();
    info.texture_buffers.push(TextureBufferResource::at(SharpLocation::Indirect {
        pointer: 60,
        dword_offset: 4,
    }));

    let table_gpa = MEMORY_BASE + 0x100;
    let swizzle = CompMapping {
        r: CompSwizzle::Blue,
        g: CompSwizzle::Green,
        b: CompSwizzle::Red,
        a: CompSwizzle::One,
    };
    let mut state = GpuState::new();
    state.set_pointer(60, table_gpa).write(
        table_gpa + 16,
        &BufferSharpBuilder::new(0x8000, 4, 16)
            .format(DataFormat::Format32, NumberFormat::Sint)
            .dst_select(swizzle)
            .dwords(),
    );

    let spec = state.specialize(&info);
    assert_eq!(mask_bits(spec.bound), vec![0]);
    assert!(spec.tex_buffers[0].is_integer);
    assert_eq!(spec.tex_buffers[0].dst_select, swizzle);
}

#[test]
fn sampled_image_swizzle_is_not_part_of_the_key() {
    let mut info = compute_program();
    info.images.push(ImageResource::at(slot(0)));
    info.images.push(ImageResource::at(slot(1)).written());

    let swizzle = CompMapping {
        r: CompSwizzle::Alpha,
        g: CompSwizzle::Blue,
        b: CompSwizzle::Green,
        a: CompSwizzle::Red,
    };
    let image = ImageSharpBuilder::new(0x1_0000, 16, 16)
        .image_type(ImageType::Color2DArray)
        .dst_select(swizzle)
        .dwords();
    let mut state = GpuState::new();
    state.bind(0, &image).bind(1, &image);
    let spec = state.specialize(&info);

    assert_eq!(spec.images[0].dst_select, CompMapping::default());
    assert!(!spec.images[0].is_storage);
    assert_eq!(spec.images[1].dst_select, swizzle);
    assert!(spec.images[1].is_storage);
    // A single-layer array binds as a plain 2D image.
    assert_eq!(spec.images[0].ty, ImageType::Color2D);
}

#[test]
fn binding_overflow_is_rejected() {
    let mut info = compute_program();
    for _ in 0..MAX_STAGE_RESOURCES {
        info.fmasks.push(FMaskResource { location: slot(0) });
    }
    let state = GpuState::new();
    assert!(state
        .try_specialize(&info, RuntimeInfo::new(Stage::Compute), &Profile::default())
        .is_ok());

    info.has_readconst = true;
    let err = state
        .try_specialize(&info, RuntimeInfo::new(Stage::Compute), &Profile::default())
        .unwrap_err();
    assert!(matches!(
        err,
        SpecializationError::BindingOverflow {
            binding: 64,
            max: 64
        }
    ));
}

#[test]
fn runtime_info_must_describe_the_program_stage() {
    let info = compute_program();
    let err = GpuState::new()
        .try_specialize(&info, RuntimeInfo::new(Stage::Fragment), &Profile::default())
        .unwrap_err();
    assert!(matches!(
        err,
        SpecializationError::RuntimeInfoStageMismatch {
            expected: Stage::Compute,
            runtime: Stage::Fragment
        }
    ));
}

#[test]
fn start_offsets_and_runtime_info_are_compared() {
    let info = two_buffer_program();
    let state = GpuState::new();
    let table = state.table();
    let profile = Profile::default();

    let base = state.specialize(&info);
    let shifted = liverpool_shader::StageSpecialization::new(
        &info,
        RuntimeInfo::new(Stage::Compute),
        &profile,
        liverpool_shader::Bindings {
            unified: 4,
            ..Default::default()
        },
        &table,
    )
    .unwrap();
    assert!(!base.matches(&shifted));

    let mut runtime_info = RuntimeInfo::new(Stage::Compute);
    if let StageRuntimeInfo::Compute(cs) = &mut runtime_info.stage {
        cs.workgroup_size = [64, 1, 1];
    }
    let wide = state.try_specialize(&info, runtime_info, &profile).unwrap();
    assert!(!base.matches(&wide));
    assert_ne!(base.bucket_hash(), wide.bucket_hash());
}

mod vertex_fetch {
    use super::*;
    use pretty_assertions::assert_eq;

    const CODE_GPA: u64 = MEMORY_BASE + 0x2000;
    const VB_TABLE_GPA: u64 = MEMORY_BASE + 0x3000;

    fn s_load_dwordx4(sdst: u32, sbase: u32, dword_offset: u32) -> u32 {
        (0b11000 << 27) | (2 << 22) | (sdst << 15) | ((sbase / 2) << 9) | (1 << 8) | dword_offset
    }

    fn buffer_load_format_xyzw(vdata: u32, vaddr: u32, srsrc: u32) -> [u32; 2] {
        [
            (0b111000 << 26) | (3 << 18) | (1 << 13),
            vaddr | (vdata << 8) | ((srsrc / 4) << 16),
        ]
    }

    fn s_setpc_b64() -> u32 {
        (0b1_0111_1101 << 23) | (0x20 << 8)
    }

    fn vertex_program() -> liverpool_shader::Info {
        let mut info = program(&[0xbe80_2000], Stage::Vertex, LogicalStage::Vertex);
        info.fetch_shader = Some(0);
        info
    }

    fn state_with_attribute(num_format: NumberFormat) -> GpuState {
        let mut code = vec![s_load_dwordx4(8, 2, 0)];
        code.extend(buffer_load_format_xyzw(4, 1, 8));
        code.push(s_setpc_b64());

        let mut state = GpuState::new();
        state
            .set_pointer(0, CODE_GPA)
            .set_pointer(2, VB_TABLE_GPA)
            .write(CODE_GPA, &code)
            .write(
                VB_TABLE_GPA,
                &BufferSharpBuilder::new(0x8000, 16, 3)
                    .format(DataFormat::Format32_32_32_32, num_format)
                    .dwords(),
            );
        state
    }

    fn legacy_profile() -> Profile {
        Profile {
            features: ProfileFeatures::LEGACY_VERTEX_ATTRIBUTES,
            ..Profile::default()
        }
    }

    #[test]
    fn attribute_number_class_is_keyed_without_legacy_typing() {
        let info = vertex_program();
        let profile = Profile::default();
        let float = state_with_attribute(NumberFormat::Float)
            .try_specialize(&info, RuntimeInfo::new(Stage::Vertex), &profile)
            .unwrap();
        let uint = state_with_attribute(NumberFormat::Uint)
            .try_specialize(&info, RuntimeInfo::new(Stage::Vertex), &profile)
            .unwrap();

        let fetch = float.fetch_shader_data.as_ref().expect("fetch shader data");
        assert_eq!(fetch.attributes.len(), 1);
        assert_eq!(fetch.attributes[0].instance_data, InstanceIdType::OverStepRate0);
        assert_eq!(float.vs_attribs.len(), 1);
        assert!(!float.matches(&uint));
        assert!(!uint.matches(&float));
    }

    #[test]
    fn legacy_typing_ignores_attribute_number_class() {
        let info = vertex_program();
        let profile = legacy_profile();
        let float = state_with_attribute(NumberFormat::Float)
            .try_specialize(&info, RuntimeInfo::new(Stage::Vertex), &profile)
            .unwrap();
        let uint = state_with_attribute(NumberFormat::Uint)
            .try_specialize(&info, RuntimeInfo::new(Stage::Vertex), &profile)
            .unwrap();

        assert!(float.vs_attribs.is_empty());
        assert!(float.matches(&uint));
        assert!(uint.matches(&float));
    }

    #[test]
    fn unreadable_fetch_shader_is_dropped() {
        common::init_tracing();
        let info = vertex_program();
        let mut state = GpuState::new();
        // Points past the end of guest memory.
        state.set_pointer(0, MEMORY_BASE + 0x10_0000);
        let spec = state.specialize(&info);
        assert!(spec.fetch_shader_data.is_none());
        assert!(spec.vs_attribs.is_empty());
    }
}

mod tessellation {
    use super::*;
    use pretty_assertions::assert_eq;

    const TESS_GPA: u64 = MEMORY_BASE + 0x4000;

    /// Constants as a guest driver lays them out for a 3-point patch list.
    const TESS_BLOB: [u32; 9] = [
        0x0000_0040, // ls_stride
        0x0000_0030, // hs_cp_stride
        0x0000_0008, // num_patches
        0x0000_0800, // hs_output_base
        0x0000_0010, // patch_const_size
        0x0000_0980, // patch_const_base
        0x0000_0090, // patch_output_size
        0x3f80_0000, // off_chip_tess_factor_threshold = 1.0
        0x0000_0000, // first_edge_tess_factor_index
    ];

    fn tess_program(stage: Stage, l_stage: LogicalStage) -> liverpool_shader::Info {
        let mut info = program(&[0xbf81_0000, l_stage as u32], stage, l_stage);
        info.tess_constants = Some(TessConstantsLocation {
            buffer: slot(0),
            dword_offset: 4,
        });
        info
    }

    fn tess_state() -> GpuState {
        let mut state = GpuState::new();
        state
            .bind(0, &BufferSharpBuilder::new(TESS_GPA, 0, 256).dwords())
            .write(TESS_GPA + 16, &TESS_BLOB);
        state
    }

    #[test]
    fn control_stage_layout_is_decoded_from_constants() {
        let info = tess_program(Stage::Hull, LogicalStage::TessellationControl);
        let mut runtime_info = RuntimeInfo::new(Stage::Hull);
        runtime_info.stage = StageRuntimeInfo::Hull(HullRuntimeInfo {
            num_input_control_points: 3,
            num_threads: 3,
            ..Default::default()
        });

        let spec = tess_state()
            .try_specialize(&info, runtime_info, &Profile::default())
            .unwrap();
        assert_eq!(
            spec.runtime_info.hull(),
            Some(&HullRuntimeInfo {
                num_input_control_points: 3,
                num_threads: 3,
                ls_stride: 0x40,
                hs_output_cp_stride: 0x30,
                hs_output_base: 0x800,
                ..Default::default()
            })
        );
    }

    #[test]
    fn eval_stage_takes_control_point_stride() {
        let info = tess_program(Stage::Vertex, LogicalStage::TessellationEval);
        let spec = tess_state()
            .try_specialize(&info, RuntimeInfo::new(Stage::Vertex), &Profile::default())
            .unwrap();
        assert_eq!(
            spec.runtime_info.vertex(),
            Some(&VertexRuntimeInfo {
                hs_output_cp_stride: 0x30,
                ..Default::default()
            })
        );
    }

    #[test]
    fn eval_stage_on_export_takes_control_point_stride() {
        let info = tess_program(Stage::Export, LogicalStage::TessellationEval);
        let mut runtime_info = RuntimeInfo::new(Stage::Export);
        runtime_info.stage = StageRuntimeInfo::Export(ExportRuntimeInfo {
            vertex_data_size: 4,
            ..Default::default()
        });

        let spec = tess_state()
            .try_specialize(&info, runtime_info, &Profile::default())
            .unwrap();
        assert_eq!(
            spec.runtime_info.stage,
            StageRuntimeInfo::Export(ExportRuntimeInfo {
                vertex_data_size: 4,
                hs_output_cp_stride: 0x30,
                ..Default::default()
            })
        );
    }

    #[test]
    fn control_program_on_the_wrong_stage_is_rejected() {
        let info = tess_program(Stage::Vertex, LogicalStage::TessellationControl);
        let err = tess_state()
            .try_specialize(&info, RuntimeInfo::new(Stage::Vertex), &Profile::default())
            .unwrap_err();
        assert!(matches!(
            err,
            SpecializationError::RuntimeInfoStageMismatch {
                expected: Stage::Hull,
                runtime: Stage::Vertex
            }
        ));
    }

    #[test]
    fn extraction_leaves_caller_runtime_info_untouched() {
        let info = tess_program(Stage::Hull, LogicalStage::TessellationControl);
        let state = tess_state();
        let table = state.table();
        let runtime_info = RuntimeInfo::new(Stage::Hull);
        let profile = Profile::default();

        let builder =
            SpecializationBuilder::new(&info, runtime_info.clone(), &profile, Default::default());
        let extracted = builder.extract(&table).unwrap();
        assert_eq!(extracted.specialization().runtime_info, runtime_info);

        let finished = extracted.finish(&table).unwrap();
        assert_ne!(finished.runtime_info, runtime_info);
        assert_eq!(runtime_info.hull(), Some(&HullRuntimeInfo::default()));
    }

    #[test]
    fn differing_constants_change_the_key() {
        let info = tess_program(Stage::Hull, LogicalStage::TessellationControl);
        let a = tess_state().specialize(&info);
        let mut state = tess_state();
        state.write(TESS_GPA + 16, &[0x80]);
        let b = state.specialize(&info);
        assert!(!a.matches(&b));
    }

    #[test]
    fn unbound_constant_buffer_is_an_error() {
        let info = tess_program(Stage::Hull, LogicalStage::TessellationControl);
        let err = GpuState::new()
            .try_specialize(&info, RuntimeInfo::new(Stage::Hull), &Profile::default())
            .unwrap_err();
        assert!(matches!(err, SpecializationError::MissingTessConstants));
    }

    #[test]
    fn faulting_constant_read_is_an_error() {
        let info = tess_program(Stage::Hull, LogicalStage::TessellationControl);
        let mut state = GpuState::new();
        state.bind(0, &BufferSharpBuilder::new(0x7000_0000, 0, 256).dwords());
        let err = state
            .try_specialize(&info, RuntimeInfo::new(Stage::Hull), &Profile::default())
            .unwrap_err();
        assert!(matches!(err, SpecializationError::TessConstantsRead(_)));
    }
}
