//! Screen transition animations
//!
//! The component runtime refers to these by name (`R.anim.fadein` and so on)
//! when switching screens, so every build writes them to `res/anim/`.

use std::path::Path;

use crate::error::{BuildError, Stage};
use crate::infra::filesystem;

const HEADER: &str = "<?xml version=\"1.0\" encoding=\"utf-8\"?>\n";
const ANDROID_NS: &str = "xmlns:android=\"http://schemas.android.com/apk/res/android\"";

/// One translate transition along an axis
struct Slide {
    name: &'static str,
    axis: char,
    from: &'static str,
    to: &'static str,
}

/// One scale-and-fade transition
struct Zoom {
    name: &'static str,
    from_scale: &'static str,
    to_scale: &'static str,
    from_alpha: &'static str,
    to_alpha: &'static str,
}

const SLIDES: [Slide; 8] = [
    Slide { name: "slide_exit", axis: 'X', from: "0%", to: "-100%" },
    Slide { name: "slide_enter", axis: 'X', from: "100%", to: "0%" },
    Slide { name: "slide_exit_reverse", axis: 'X', from: "0%", to: "100%" },
    Slide { name: "slide_enter_reverse", axis: 'X', from: "-100%", to: "0%" },
    Slide { name: "slide_v_exit", axis: 'Y', from: "0%", to: "-100%" },
    Slide { name: "slide_v_enter", axis: 'Y', from: "100%", to: "0%" },
    Slide { name: "slide_v_exit_reverse", axis: 'Y', from: "0%", to: "100%" },
    Slide { name: "slide_v_enter_reverse", axis: 'Y', from: "-100%", to: "0%" },
];

const ZOOMS: [Zoom; 4] = [
    Zoom { name: "zoom_enter", from_scale: "2.0", to_scale: "1.0", from_alpha: "0", to_alpha: "1.0" },
    Zoom { name: "zoom_exit", from_scale: "1.0", to_scale: ".5", from_alpha: "1.0", to_alpha: "0" },
    Zoom { name: "zoom_enter_reverse", from_scale: ".5", to_scale: "1.0", from_alpha: "0", to_alpha: "1.0" },
    Zoom { name: "zoom_exit_reverse", from_scale: "1.0", to_scale: "2.0", from_alpha: "1.0", to_alpha: "0" },
];

fn fade(from: &str, to: &str) -> String {
    format!(
        "{HEADER}<alpha {ANDROID_NS}\n    \
         android:interpolator=\"@android:anim/accelerate_interpolator\"\n    \
         android:fromAlpha=\"{from}\" android:toAlpha=\"{to}\"\n    \
         android:duration=\"@android:integer/config_mediumAnimTime\" />\n"
    )
}

fn hold() -> String {
    format!(
        "{HEADER}<translate {ANDROID_NS}\n    \
         android:interpolator=\"@android:anim/accelerate_interpolator\"\n    \
         android:fromXDelta=\"0\" android:toXDelta=\"0\"\n    \
         android:duration=\"@android:integer/config_longAnimTime\" />\n"
    )
}

fn slide(s: &Slide) -> String {
    format!(
        "{HEADER}<set {ANDROID_NS}\n    \
         android:interpolator=\"@android:anim/decelerate_interpolator\">\n  \
         <translate android:from{axis}Delta=\"{from}\" android:to{axis}Delta=\"{to}\"\n      \
         android:duration=\"@android:integer/config_mediumAnimTime\" />\n\
         </set>\n",
        axis = s.axis,
        from = s.from,
        to = s.to,
    )
}

fn zoom(z: &Zoom) -> String {
    format!(
        "{HEADER}<set {ANDROID_NS}\n    \
         android:interpolator=\"@android:anim/decelerate_interpolator\">\n  \
         <scale android:fromXScale=\"{fs}\" android:toXScale=\"{ts}\"\n      \
         android:fromYScale=\"{fs}\" android:toYScale=\"{ts}\"\n      \
         android:pivotX=\"50%p\" android:pivotY=\"50%p\"\n      \
         android:duration=\"@android:integer/config_mediumAnimTime\" />\n  \
         <alpha android:fromAlpha=\"{fa}\" android:toAlpha=\"{ta}\"\n      \
         android:duration=\"@android:integer/config_mediumAnimTime\" />\n\
         </set>\n",
        fs = z.from_scale,
        ts = z.to_scale,
        fa = z.from_alpha,
        ta = z.to_alpha,
    )
}

/// All transition resources as `(file name, contents)`
pub fn animations() -> Vec<(String, String)> {
    let mut files = vec![
        ("fadein.xml".to_string(), fade("0.0", "1.0")),
        ("fadeout.xml".to_string(), fade("1.0", "0.0")),
        ("hold.xml".to_string(), hold()),
    ];
    files.extend(ZOOMS.iter().map(|z| (format!("{}.xml", z.name), zoom(z))));
    files.extend(SLIDES.iter().map(|s| (format!("{}.xml", s.name), slide(s))));
    files
}

/// Write every transition into `anim_dir`
pub fn write_animations(anim_dir: &Path) -> Result<(), BuildError> {
    for (name, contents) in animations() {
        filesystem::write_file(&anim_dir.join(name), &contents)
            .map_err(|e| BuildError::stage(Stage::Animation, e))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_fifteen_distinct_animations() {
        let files = animations();
        assert_eq!(files.len(), 15);
        let names: std::collections::BTreeSet<_> = files.iter().map(|(n, _)| n.clone()).collect();
        assert_eq!(names.len(), 15);
        assert!(names.contains("slide_v_enter_reverse.xml"));
        assert!(names.contains("zoom_exit.xml"));
    }

    #[test]
    fn test_animations_are_well_formed() {
        for (name, contents) in animations() {
            let mut reader = quick_xml::Reader::from_str(&contents);
            loop {
                match reader.read_event() {
                    Ok(quick_xml::events::Event::Eof) => break,
                    Ok(_) => {}
                    Err(e) => panic!("{name} is malformed: {e}"),
                }
            }
        }
    }

    #[test]
    fn test_vertical_slides_use_y_axis() {
        let files = animations();
        let (_, body) = files.iter().find(|(n, _)| n == "slide_v_exit.xml").unwrap();
        assert!(body.contains("android:fromYDelta=\"0%\""));
        assert!(body.contains("android:toYDelta=\"-100%\""));
    }

    #[test]
    fn test_write_animations() {
        let temp = TempDir::new().unwrap();
        write_animations(&temp.path().join("anim")).unwrap();
        assert_eq!(std::fs::read_dir(temp.path().join("anim")).unwrap().count(), 15);
    }
}
