//! Integration tests for the nightfall crates.
//!
//! This crate contains end-to-end tests that go through real files on disk:
//! write a LUT, load it back with each layout, grade pixels and compare.
//! The fixture generators are shared with the golden hash tests and must
//! stay in sync with `parity/generate_golden.py`.

#[cfg(test)]
mod golden;

pub mod fixtures {
    //! LUT text and pixel generators.

    /// Grid dimension of both golden fixtures.
    pub const SIZE: usize = 17;

    fn micro(v: u32) -> String {
        format!("{}.{:06}", v / 1_000_000, v % 1_000_000)
    }

    /// Warm "sunset" CUBE in the fixed layout.
    ///
    /// Values are written with six exact decimals so every reader parses
    /// the same doubles.
    pub fn sunset_cube() -> String {
        let mut out = String::from(
            "# Sunset grade\n\
             TITLE \"sunset\"\n\
             \n\
             #\n\
             # LUT size\n\
             LUT_3D_SIZE 17\n\
             \n\
             # Data domain\n\
             DOMAIN_MIN 0.0 0.0 0.0\n\
             DOMAIN_MAX 1.0 1.0 1.0\n\
             \n\
             # LUT data points\n",
        );
        let d = SIZE as u32;
        for b in 0..d {
            for g in 0..d {
                for r in 0..d {
                    let red = (r * 62_500 + 40_000).min(1_000_000);
                    let green = g * 55_000 + b * 3_000;
                    let blue = b * 40_000 + r * 500;
                    out.push_str(&format!("{} {} {}\n", micro(red), micro(green), micro(blue)));
                }
            }
        }
        out
    }

    /// Breakpoints of the night fixture: 64-step grid ending at 1023.
    pub fn night_indices() -> Vec<u32> {
        (0..SIZE as u32 - 1).map(|i| i * 64).chain([1023]).collect()
    }

    /// Cool "night" 3DL in the fixed layout.
    pub fn night_3dl() -> String {
        let indices: Vec<String> = night_indices().iter().map(|i| i.to_string()).collect();
        let mut out = format!("# Night grade\n3DMESH\n{}\n", indices.join(" "));
        let d = SIZE as u32;
        for b in 0..d {
            for g in 0..d {
                for r in 0..d {
                    out.push_str(&format!("{} {} {}\n", r * 150, g * 170 + b * 20, b * 230 + 300));
                }
            }
        }
        out
    }

    /// 256 RGBA pixels with decorrelated channels.
    pub fn ramp() -> Vec<u8> {
        (0..256u32)
            .flat_map(|i| [i, i * 7 % 256, i * 13 % 256, i].map(|c| c as u8))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::fixtures;
    use approx::assert_relative_eq;
    use nightfall_lut::{
        CubeSampling, FixedLayout, KeywordLayout, Lattice, LatticeKind, LutCache, LutError,
        LutFormat, TransformOptions, apply_lookup_table, apply_lookup_table_with,
        parse_lookup_table, read_lookup_table, read_lookup_table_with, write_3dl, write_cube,
    };
    use std::sync::Arc;
    use tempfile::tempdir;

    /// Two-point CUBE whose green output follows the green input corner.
    fn green_tint() -> Lattice {
        Lattice::from_fn(2, LatticeKind::Cube, |_, g, _| [0.0, 255.0 * g as f64, 0.0]).unwrap()
    }

    #[test]
    fn test_green_tint_from_disk() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("tint.cube");
        write_cube(&path, &green_tint()).unwrap();

        let lut = read_lookup_table(&path).unwrap();
        assert_eq!(lut, green_tint());

        // 1/2 lands exactly halfway along every axis
        let out = apply_lookup_table(&lut, &[1, 1, 1, 0]).unwrap();
        assert_eq!(out, vec![0, 128, 0, 255]);

        // 128/2 is past the last grid point and clamps to the white corner
        let out = apply_lookup_table(&lut, &[128, 128, 128, 7]).unwrap();
        assert_eq!(out, vec![0, 255, 0, 255]);

        let normalized = TransformOptions::default().with_sampling(CubeSampling::Normalized);
        let out = apply_lookup_table_with(&lut, &[128, 128, 128, 7], &normalized).unwrap();
        assert_eq!(out, vec![0, 128, 0, 255]);
    }

    #[test]
    fn test_cube_grid_points_reproduced() {
        let lut = parse_lookup_table(&fixtures::sunset_cube(), LutFormat::Cube).unwrap();
        let pixels: Vec<u8> = (0..=15u8).flat_map(|k| [k * 17, k * 17, k * 17, 0]).collect();
        let out = apply_lookup_table(&lut, &pixels).unwrap();

        for (k, px) in out.chunks_exact(4).enumerate() {
            let expected = lut.get(k, k, k).map(|v| v.round() as u8);
            assert_eq!(&px[..3], &expected, "grid point {}", k);
            assert_eq!(px[3], 255);
        }
    }

    #[test]
    fn test_3dl_grid_points_reproduced() {
        let indices = vec![3.0, 259.0, 515.0, 771.0, 1023.0];
        let lut = Lattice::from_fn(5, LatticeKind::ThreeDl { indices }, |r, g, b| {
            // 12-bit values that encode back to whole bytes
            [r * 50 + 10, g * 40 + 20, b * 30 + 5].map(|v| ((v + 1) * 16 - 1) as f64)
        })
        .unwrap();

        let channels = [0u8, 64, 128, 192, 255];
        let pixels: Vec<u8> = (0..5)
            .flat_map(|k| [channels[k], channels[4 - k], channels[k], 9])
            .collect();
        let out = apply_lookup_table(&lut, &pixels).unwrap();

        for (k, px) in out.chunks_exact(4).enumerate() {
            let (r, g, b) = (k, 4 - k, k);
            assert_eq!(
                px,
                [(r * 50 + 10) as u8, (g * 40 + 20) as u8, (b * 30 + 5) as u8, 255],
                "grid point {}",
                k
            );
        }
    }

    #[test]
    fn test_repeated_loads_identical() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("night.3dl");
        std::fs::write(&path, fixtures::night_3dl()).unwrap();

        let a = read_lookup_table(&path).unwrap();
        let b = read_lookup_table(&path).unwrap();
        assert_eq!(a, b);

        let pixels = fixtures::ramp();
        assert_eq!(
            apply_lookup_table(&a, &pixels).unwrap(),
            apply_lookup_table(&b, &pixels).unwrap()
        );
    }

    #[test]
    fn test_layouts_agree_on_written_files() {
        let dir = tempdir().unwrap();
        let cube = parse_lookup_table(&fixtures::sunset_cube(), LutFormat::Cube).unwrap();
        let night = parse_lookup_table(&fixtures::night_3dl(), LutFormat::ThreeDl).unwrap();

        let cube_path = dir.path().join("sunset.cube");
        let night_path = dir.path().join("night.3dl");
        write_cube(&cube_path, &cube).unwrap();
        write_3dl(&night_path, &night).unwrap();

        for path in [&cube_path, &night_path] {
            let fixed = read_lookup_table_with(path, &FixedLayout).unwrap();
            let keyword = read_lookup_table_with(path, &KeywordLayout).unwrap();
            assert_eq!(fixed, keyword, "{}", path.display());
        }

        // integer 3DL values survive exactly; CUBE goes through 6 decimals
        assert_eq!(read_lookup_table(&night_path).unwrap(), night);
        let reread = read_lookup_table(&cube_path).unwrap();
        for (a, b) in reread.data().iter().zip(cube.data()) {
            for c in 0..3 {
                assert_relative_eq!(a[c], b[c], epsilon = 1e-3);
            }
        }
    }

    #[test]
    fn test_keyword_layout_accepts_loose_cube() {
        let text = "LUT_3D_SIZE 2\n\
                    # written by hand\n\
                    TITLE \"loose\"\n\
                    0 0 0\n1 0 0\n0 1 0\n1 1 0\n\
                    \n\
                    0 0 1\n1 0 1\n0 1 1\n1 1 1\n";
        let dir = tempdir().unwrap();
        let path = dir.path().join("loose.CUBE");
        std::fs::write(&path, text).unwrap();

        let err = read_lookup_table(&path).unwrap_err();
        assert!(matches!(err, LutError::MalformedLut { .. }), "{:?}", err);

        let lut = read_lookup_table_with(&path, &KeywordLayout).unwrap();
        assert_eq!(lut.size(), 2);
        assert_eq!(lut.get(1, 0, 1), [255.0, 0.0, 255.0]);
    }

    #[test]
    fn test_serde_roundtrip() {
        let night = parse_lookup_table(&fixtures::night_3dl(), LutFormat::ThreeDl).unwrap();
        let json = serde_json::to_string(&night).unwrap();
        let back: Lattice = serde_json::from_str(&json).unwrap();
        assert_eq!(back, night);

        let short = r#"{"size":3,"data":[[0.0,0.0,0.0]],"kind":"Cube"}"#;
        assert!(serde_json::from_str::<Lattice>(short).is_err());

        let descending = r#"{"size":2,"data":[[0,0,0],[0,0,0],[0,0,0],[0,0,0],[0,0,0],[0,0,0],[0,0,0],[0,0,0]],"kind":{"ThreeDl":{"indices":[1023.0,0.0]}}}"#;
        assert!(serde_json::from_str::<Lattice>(descending).is_err());
    }

    #[test]
    fn test_shared_lattice_across_threads() {
        let lut = Arc::new(parse_lookup_table(&fixtures::sunset_cube(), LutFormat::Cube).unwrap());
        let pixels = fixtures::ramp();
        let whole = apply_lookup_table(&lut, &pixels).unwrap();

        let parts: Vec<Vec<u8>> = std::thread::scope(|s| {
            let handles: Vec<_> = pixels
                .chunks(256)
                .map(|chunk| {
                    let lut = Arc::clone(&lut);
                    s.spawn(move || {
                        let sequential = TransformOptions::default().sequential();
                        apply_lookup_table_with(&lut, chunk, &sequential).unwrap()
                    })
                })
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });

        assert_eq!(parts.concat(), whole);
    }

    #[test]
    fn test_cache_from_dir() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("sunset.cube"), fixtures::sunset_cube()).unwrap();
        std::fs::write(dir.path().join("night.3dl"), fixtures::night_3dl()).unwrap();

        let cache = LutCache::from_dir(dir.path());
        let sunset = cache.get("sunset").unwrap();
        let night = cache.get("night.3dl").unwrap();
        assert_eq!(sunset.format(), LutFormat::Cube);
        assert_eq!(night.format(), LutFormat::ThreeDl);

        let again = cache.get("sunset").unwrap();
        assert!(Arc::ptr_eq(&sunset, &again));

        assert!(cache.get("missing").is_err());

        let stats = cache.stats();
        assert_eq!(stats.loads, 2);
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 3);
        assert_eq!(stats.failures, 1);
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn test_unknown_extension_rejected() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("grade.lut");
        std::fs::write(&path, fixtures::sunset_cube()).unwrap();
        assert!(matches!(
            read_lookup_table(&path),
            Err(LutError::UnsupportedFormat(_))
        ));
    }
}
