//! Tag name to widget class resolution.

use super::SelectorError;

/// Class returned for the bare `view` tag.
pub const GENERIC_VIEW_CLASS: &str = "android.view.View";

const WIDGET_PACKAGE: &str = "android.widget.";

/// Tags that may never be turned into a class selector.
const DENIED_TAGS: &[&str] = &["secure"];

/// Short tag names (lowercase) and the class each one stands for.
const ALIASES: &[(&str, &str)] = &[
    ("abslist", "android.widget.AbsListView"),
    ("absseek", "android.widget.AbsSeekBar"),
    ("absspinner", "android.widget.AbsSpinner"),
    ("absolute", "android.widget.AbsoluteLayout"),
    ("adapterview", "android.widget.AdapterView"),
    ("adapterviewanimator", "android.widget.AdapterViewAnimator"),
    ("adapterviewflipper", "android.widget.AdapterViewFlipper"),
    ("analogclock", "android.widget.AnalogClock"),
    ("appwidgethostview", "android.appwidget.AppWidgetHostView"),
    ("autocompletetext", "android.widget.AutoCompleteTextView"),
    ("button", "android.widget.Button"),
    ("breadcrumbs", "android.app.FragmentBreadCrumbs"),
    ("calendar", "android.widget.CalendarView"),
    ("checkbox", "android.widget.CheckBox"),
    ("checked", "android.widget.CheckedTextView"),
    ("chronometer", "android.widget.Chronometer"),
    ("compoundbutton", "android.widget.CompoundButton"),
    ("datepicker", "android.widget.DatePicker"),
    ("dialerfilter", "android.widget.DialerFilter"),
    ("digitalclock", "android.widget.DigitalClock"),
    ("drawer", "android.widget.SlidingDrawer"),
    ("expandablelist", "android.widget.ExpandableListView"),
    ("extract", "android.inputmethodservice.ExtractEditText"),
    ("fragmenttabhost", "android.support.v4.app.FragmentTabHost"),
    ("frame", "android.widget.FrameLayout"),
    ("fullscreen", "android.widget.FrameLayout"),
    ("gallery", "android.widget.Gallery"),
    ("gesture", "android.gesture.GestureOverlayView"),
    ("glsurface", "android.opengl.GLSurfaceView"),
    ("grid", "android.widget.GridView"),
    ("gridlayout", "android.widget.GridLayout"),
    ("horizontal", "android.widget.HorizontalScrollView"),
    ("image", "android.widget.ImageView"),
    ("imagebutton", "android.widget.ImageButton"),
    ("imageswitcher", "android.widget.ImageSwitcher"),
    ("keyboard", "android.inputmethodservice.KeyboardView"),
    ("linear", "android.widget.LinearLayout"),
    ("list", "android.widget.ListView"),
    ("media", "android.widget.MediaController"),
    ("mediaroutebutton", "android.app.MediaRouteButton"),
    ("multiautocompletetext", "android.widget.MultiAutoCompleteTextView"),
    ("numberpicker", "android.widget.NumberPicker"),
    ("pagetabstrip", "android.support.v4.view.PagerTabStrip"),
    ("pagetitlestrip", "android.support.v4.view.PagerTitleStrip"),
    ("progress", "android.widget.ProgressBar"),
    ("quickcontactbadge", "android.widget.QuickContactBadge"),
    ("radio", "android.widget.RadioButton"),
    ("radiogroup", "android.widget.RadioGroup"),
    ("rating", "android.widget.RatingBar"),
    ("relative", "android.widget.RelativeLayout"),
    ("row", "android.widget.TableRow"),
    ("rssurface", "android.renderscript.RSSurfaceView"),
    ("rstexture", "android.renderscript.RSTextureView"),
    ("scroll", "android.widget.ScrollView"),
    ("search", "android.widget.SearchView"),
    ("seek", "android.widget.SeekBar"),
    ("space", "android.widget.Space"),
    ("spinner", "android.widget.Spinner"),
    ("stack", "android.widget.StackView"),
    ("surface", "android.view.SurfaceView"),
    ("switch", "android.widget.Switch"),
    ("tabhost", "android.widget.TabHost"),
    ("tabwidget", "android.widget.TabWidget"),
    ("table", "android.widget.TableLayout"),
    ("text", "android.widget.TextView"),
    ("textclock", "android.widget.TextClock"),
    ("textswitcher", "android.widget.TextSwitcher"),
    ("texture", "android.view.TextureView"),
    ("textfield", "android.widget.EditText"),
    ("timepicker", "android.widget.TimePicker"),
    ("toggle", "android.widget.ToggleButton"),
    ("twolinelistitem", "android.widget.TwoLineListItem"),
    ("video", "android.widget.VideoView"),
    ("viewanimator", "android.widget.ViewAnimator"),
    ("viewflipper", "android.widget.ViewFlipper"),
    ("viewgroup", "android.view.ViewGroup"),
    ("viewpager", "android.support.v4.view.ViewPager"),
    ("viewstub", "android.view.ViewStub"),
    ("viewswitcher", "android.widget.ViewSwitcher"),
    ("web", "android.webkit.WebView"),
    ("window", "android.widget.FrameLayout"),
    ("zoombutton", "android.widget.ZoomButton"),
    ("zoomcontrols", "android.widget.ZoomControls"),
];

/// Immutable tag to class lookup.
///
/// The tables are compiled-in constants; a `ClassMap` only borrows them, so
/// resolvers take it by reference and resolution never mutates anything.
#[derive(Debug, Clone, Copy)]
pub struct ClassMap {
    denied: &'static [&'static str],
    aliases: &'static [(&'static str, &'static str)],
}

static STANDARD: ClassMap = ClassMap {
    denied: DENIED_TAGS,
    aliases: ALIASES,
};

impl ClassMap {
    pub fn standard() -> &'static ClassMap {
        &STANDARD
    }

    pub fn aliases(&self) -> impl Iterator<Item = (&'static str, &'static str)> + '_ {
        self.aliases.iter().copied()
    }

    /// Resolves `tag` to a fully-qualified class name.
    ///
    /// First match wins: deny-list (any case), `view`, alias table, names
    /// that already contain a `.`, then `android.widget.` plus the tag with
    /// its first character upper-cased.
    pub fn resolve(&self, tag: &str) -> Result<String, SelectorError> {
        let lowered = tag.to_lowercase();
        if self.denied.iter().any(|denied| *denied == lowered) {
            return Err(SelectorError::UnallowedTagName(tag.to_string()));
        }
        if tag == "view" {
            return Ok(GENERIC_VIEW_CLASS.to_string());
        }
        if let Some((_, class)) = self.aliases.iter().find(|(alias, _)| *alias == lowered) {
            return Ok((*class).to_string());
        }
        if tag.contains('.') {
            return Ok(tag.to_string());
        }
        Ok(format!("{}{}", WIDGET_PACKAGE, capitalize(tag)))
    }
}

fn capitalize(tag: &str) -> String {
    let mut chars = tag.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
