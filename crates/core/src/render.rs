use std::fmt;
use std::str::FromStr;

use crate::domain::{Coordinate, ImageAsset};
use crate::error::Error;
use crate::kml::Element;

pub const ICON_SCALE: f64 = 2.0;
pub const IMAGE_MAX_CSS: &str = "800px";

pub const PATH_NAME: &str = "Path";
/// Spring green, KML `aabbggrr`.
pub const PATH_LINE_COLOR: &str = "ff7fff00";
pub const PATH_LINE_WIDTH: f64 = 4.0;

const FOV_DEGREES: f64 = 20.0;

/// How a photo is presented in the viewer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RenderMode {
    /// Image projected above the map with a camera looking at it.
    PhotoOverlay,
    /// Image in a `gx:Carousel`, HTML description.
    #[default]
    GxCarousel,
    /// Image in an HTML balloon template.
    HtmlBalloon,
    /// Balloon shows an HTML description that carries a full-width image.
    HtmlBalloonPanel,
    /// Image inside the HTML description.
    DescriptionImage,
}

impl RenderMode {
    pub const ALL: [RenderMode; 5] = [
        RenderMode::PhotoOverlay,
        RenderMode::GxCarousel,
        RenderMode::HtmlBalloon,
        RenderMode::HtmlBalloonPanel,
        RenderMode::DescriptionImage,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            RenderMode::PhotoOverlay => "photo-overlay",
            RenderMode::GxCarousel => "gx-carousel",
            RenderMode::HtmlBalloon => "html-balloon",
            RenderMode::HtmlBalloonPanel => "html-balloon-panel",
            RenderMode::DescriptionImage => "description-image",
        }
    }

    /// Build the element for one asset. Display name, description and both
    /// resolved references must already be set.
    pub fn render(&self, asset: &ImageAsset) -> Element {
        match self {
            RenderMode::PhotoOverlay => photo_overlay(asset),
            RenderMode::GxCarousel => gx_carousel(asset),
            RenderMode::HtmlBalloon => html_balloon(asset),
            RenderMode::HtmlBalloonPanel => html_balloon_panel(asset),
            RenderMode::DescriptionImage => description_image(asset),
        }
    }
}

impl fmt::Display for RenderMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for RenderMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mode = match s.trim().to_ascii_lowercase().as_str() {
            "photo-overlay" | "g-earth-photo-overlay" => RenderMode::PhotoOverlay,
            "gx-carousel" | "g-earth-web" => RenderMode::GxCarousel,
            "html-balloon" | "g-earth-pro" => RenderMode::HtmlBalloon,
            "html-balloon-panel" | "g-earth-web-panel" => RenderMode::HtmlBalloonPanel,
            "description-image" | "g-maps" => RenderMode::DescriptionImage,
            _ => return Err(Error::UnknownMode(s.to_string())),
        };
        Ok(mode)
    }
}

/// Line placemark through the given points.
pub fn path_placemark(points: &[Coordinate]) -> Element {
    let coordinates = points
        .iter()
        .map(Coordinate::to_kml)
        .collect::<Vec<_>>()
        .join(" ");

    Element::new("Placemark")
        .text_child("name", PATH_NAME)
        .child(
            Element::new("Style").child(
                Element::new("LineStyle")
                    .text_child("color", PATH_LINE_COLOR)
                    .text_child("width", PATH_LINE_WIDTH.to_string()),
            ),
        )
        .child(
            Element::new("LineString")
                .text_child("extrude", "1")
                .text_child("tessellate", "1")
                .text_child("coordinates", coordinates),
        )
}

/// Left and right field of view for a photo overlay, from the aspect ratio.
pub fn horizontal_fov(asset: &ImageAsset) -> (f64, f64) {
    let ratio = asset.aspect_ratio();
    (-FOV_DEGREES * ratio, FOV_DEGREES * ratio)
}

fn html_page(body: &str) -> String {
    format!("<!DOCTYPE html><html><head></head><body>\n{body}\n</body></html>")
}

fn bounded_img(src: &str) -> String {
    format!(
        "<img src=\"{src}\" style=\"display: block; max-width:{IMAGE_MAX_CSS}; max-height:{IMAGE_MAX_CSS}; width: auto; height: auto;\" />"
    )
}

fn point(asset: &ImageAsset) -> Element {
    Element::new("Point").text_child("coordinates", asset.coordinate().to_kml())
}

fn icon_style(asset: &ImageAsset) -> Element {
    Element::new("IconStyle")
        .text_child("scale", ICON_SCALE.to_string())
        .child(Element::new("Icon").text_child("href", &asset.resolved_icon_path))
}

fn placemark(asset: &ImageAsset, description: String, style: Element) -> Element {
    Element::new("Placemark")
        .text_child("name", &asset.display_name)
        .text_child("description", description)
        .child(point(asset))
        .child(style)
}

fn gx_carousel(asset: &ImageAsset) -> Element {
    let description = html_page(&format!("<p>{}</p>", asset.display_description));
    placemark(asset, description, Element::new("Style").child(icon_style(asset))).child(
        Element::new("gx:Carousel").child(
            Element::new("gx:Image").text_child("gx:ImageUrl", &asset.resolved_image_path),
        ),
    )
}

fn html_balloon(asset: &ImageAsset) -> Element {
    let template = format!(
        r#"
<!DOCTYPE html>
<html>
<head>
	<style>
		img {{display: block; max-width:{max}; max-height:{max}; width: auto; height: auto;}}
	</style>
</head>
<body>
	<p><b>$[name]</b></p>
	<p>$[description]</p>
	<img src="{src}"/>
</body>
</html>
"#,
        max = IMAGE_MAX_CSS,
        src = asset.resolved_image_path,
    );
    let style = Element::new("Style")
        .child(icon_style(asset))
        .child(Element::new("BalloonStyle").text_child("text", template));
    placemark(asset, asset.display_description.clone(), style)
}

fn html_balloon_panel(asset: &ImageAsset) -> Element {
    let description = html_page(&format!(
        "<p>{}</p>\n<img src=\"{}\" style=\"display: block; width: 100%; height: auto;\" />",
        asset.display_description, asset.resolved_image_path
    ));
    let style = Element::new("Style")
        .child(icon_style(asset))
        .child(Element::new("BalloonStyle").text_child("text", "$[description]"));
    placemark(asset, description, style)
}

fn description_image(asset: &ImageAsset) -> Element {
    let description = html_page(&format!(
        "<p>{}</p>\n{}",
        asset.display_description,
        bounded_img(&asset.resolved_image_path)
    ));
    placemark(asset, description, Element::new("Style").child(icon_style(asset)))
}

fn photo_overlay(asset: &ImageAsset) -> Element {
    let id = format!("photo-{}", asset.display_name);
    let (left_fov, right_fov) = horizontal_fov(asset);
    let coordinate = asset.coordinate();

    Element::new("PhotoOverlay")
        .attr("id", &id)
        .text_child("name", &asset.display_name)
        .text_child(
            "description",
            html_page(&format!("<a href=\"#{id}\">Click here to fly into photo</a><br>")),
        )
        .text_child("open", "0")
        .text_child("visibility", "1")
        .child(Element::new("Icon").text_child("href", &asset.resolved_image_path))
        .child(
            Element::new("Camera")
                .text_child("longitude", coordinate.longitude.to_string())
                .text_child("latitude", coordinate.latitude.to_string())
                .text_child("altitude", "10")
                .text_child("tilt", "90"),
        )
        .child(point(asset))
        .text_child("rotation", "0")
        .child(
            Element::new("ViewVolume")
                .text_child("leftFov", left_fov.to_string())
                .text_child("rightFov", right_fov.to_string())
                .text_child("bottomFov", (-FOV_DEGREES).to_string())
                .text_child("topFov", FOV_DEGREES.to_string())
                .text_child("near", "10"),
        )
        .text_child("shape", "rectangle")
        .child(
            Element::new("Style")
                .child(icon_style(asset))
                .child(Element::new("BalloonStyle").text_child("displayMode", "hide")),
        )
}
