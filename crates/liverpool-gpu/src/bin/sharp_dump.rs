use std::env;
use std::process;

use anyhow::{bail, Context};
use liverpool_gpu::{BufferSharp, ImageSharp, SamplerSharp};

fn usage() -> &'static str {
    "\
sharp_dump: decode raw GPU resource descriptor dwords

USAGE:
    cargo run -p liverpool-gpu --bin sharp_dump -- <buffer|image|sampler> <dword>...

Dwords are hexadecimal (with or without a 0x prefix). Buffers and samplers take 4 dwords;
images take 4 (R128) or 8.
"
}

fn main() {
    if let Err(err) = real_main() {
        eprintln!("error: {err:#}");
        process::exit(1);
    }
}

fn parse_dword(arg: &str) -> anyhow::Result<u32> {
    let digits = arg
        .strip_prefix("0x")
        .or_else(|| arg.strip_prefix("0X"))
        .unwrap_or(arg);
    u32::from_str_radix(digits, 16).with_context(|| format!("invalid dword {arg:?}"))
}

fn real_main() -> anyhow::Result<()> {
    let mut args = env::args().skip(1);
    let Some(kind) = args.next() else {
        bail!("missing descriptor kind\n\n{}", usage());
    };
    if kind == "-h" || kind == "--help" {
        print!("{}", usage());
        return Ok(());
    }
    let dwords = args
        .map(|a| parse_dword(&a))
        .collect::<anyhow::Result<Vec<u32>>>()?;

    match (kind.as_str(), dwords.len()) {
        ("buffer", 4) => {
            let mut raw = [0u32; 4];
            raw.copy_from_slice(&dwords);
            dump_buffer(BufferSharp::from_dwords(raw));
        }
        ("image", 4) => {
            let mut raw = [0u32; 4];
            raw.copy_from_slice(&dwords);
            dump_image(ImageSharp::from_r128(raw));
        }
        ("image", 8) => {
            let mut raw = [0u32; 8];
            raw.copy_from_slice(&dwords);
            dump_image(ImageSharp::from_dwords(raw));
        }
        ("sampler", 4) => {
            let mut raw = [0u32; 4];
            raw.copy_from_slice(&dwords);
            dump_sampler(SamplerSharp::from_dwords(raw));
        }
        ("buffer" | "image" | "sampler", n) => {
            bail!("wrong dword count {n} for {kind}\n\n{}", usage());
        }
        _ => bail!("unknown descriptor kind {kind:?}\n\n{}", usage()),
    }
    Ok(())
}

fn dump_buffer(sharp: BufferSharp) {
    println!("V# {:08x?}", sharp.dwords());
    if sharp.is_null() {
        println!("  (null)");
    }
    println!("  base_address   0x{:x}", sharp.base_address());
    println!("  stride         {}", sharp.stride());
    println!("  num_records    {}", sharp.num_records());
    println!("  size           {}", sharp.size());
    println!(
        "  format         {:?} / {:?} ({:?})",
        sharp.data_format(),
        sharp.number_format(),
        sharp.number_format().class()
    );
    println!("  conversion     {:?}", sharp.number_conversion());
    println!("  dst_select     {}", sharp.dst_select());
    println!("  index_stride   {}", sharp.index_stride());
    println!("  add_tid        {}", sharp.add_tid_enabled());
}

fn dump_image(sharp: ImageSharp) {
    println!("T# {:08x?}", sharp.dwords());
    if sharp.is_null() {
        println!("  (null)");
    }
    println!("  base_address   0x{:x}", sharp.base_address());
    println!(
        "  type           {:?} (bound as {:?})",
        sharp.image_type(),
        sharp.bound_type()
    );
    println!("  extent         {}x{}x{}", sharp.width(), sharp.height(), sharp.depth());
    println!("  pitch          {}", sharp.pitch());
    println!("  levels         {}..={}", sharp.base_level(), sharp.last_level());
    println!("  layers         {}..={}", sharp.base_array(), sharp.last_array());
    println!(
        "  format         {:?} / {:?}",
        sharp.data_format(),
        sharp.number_format()
    );
    println!("  conversion     {:?}", sharp.number_conversion());
    println!("  dst_select     {}", sharp.dst_select());
    println!("  tiling_index   {}", sharp.tiling_index());
}

fn dump_sampler(sharp: SamplerSharp) {
    println!("S# {:08x?}", sharp.dwords());
    println!(
        "  clamp          {:?} {:?} {:?}",
        sharp.clamp_x(),
        sharp.clamp_y(),
        sharp.clamp_z()
    );
    println!(
        "  filter         mag={:?} min={:?} mip={:?}",
        sharp.mag_filter(),
        sharp.min_filter(),
        sharp.mip_filter()
    );
    println!("  aniso          {}x", 1u32 << sharp.max_aniso_ratio());
    println!("  depth_compare  {:?}", sharp.depth_compare());
    println!("  lod            {}..={}", sharp.min_lod(), sharp.max_lod());
    println!("  unnormalized   {}", sharp.force_unnormalized());
    println!("  force_degamma  {}", sharp.force_degamma());
    println!(
        "  border_color   type={} ptr={}",
        sharp.border_color_type(),
        sharp.border_color_ptr()
    );
}
