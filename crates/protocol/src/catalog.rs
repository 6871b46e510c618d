//! Constant catalogs shared between the engine and the application.
//!
//! Every catalog is a closed enum whose serialized form is the verbatim
//! identifier the engine uses on the wire. Adding a member is a contract
//! change on both sides; removing one is a breaking change. Lookups are
//! exhaustive matches so a missing mapping fails to compile instead of
//! silently producing nothing.

use serde::{Deserialize, Serialize};

/// An identifier that does not belong to the catalog it was parsed against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownIdentifier {
    /// Name of the catalog the lookup ran against.
    pub catalog: &'static str,
    /// The offending identifier.
    pub value: String,
}

impl std::fmt::Display for UnknownIdentifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "unknown {} identifier: {:?}", self.catalog, self.value)
    }
}

impl std::error::Error for UnknownIdentifier {}

macro_rules! catalog {
    (
        $(#[$meta:meta])*
        $name:ident {
            $($(#[$vmeta:meta])* $variant:ident => $ident:literal),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum $name {
            $($(#[$vmeta])* #[serde(rename = $ident)] $variant),+
        }

        impl $name {
            /// Every member of the catalog, in declaration order.
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            /// The verbatim engine identifier.
            pub const fn as_str(self) -> &'static str {
                match self { $($name::$variant => $ident),+ }
            }
        }

        impl std::str::FromStr for $name {
            type Err = UnknownIdentifier;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($ident => Ok($name::$variant),)+
                    other => Err(UnknownIdentifier {
                        catalog: stringify!($name),
                        value: other.to_string(),
                    }),
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

catalog! {
    /// Named tracking mode selecting which engine capabilities are active.
    TrackingConfiguration {
        /// Rear camera, full positional tracking, plane detection, hit
        /// testing.
        World => "ARWorldTrackingConfiguration",
        /// Rear camera, orientation-only tracking.
        Orientation => "AROrientationTrackingConfiguration",
        /// Front camera, face pose and expression tracking.
        Face => "ARFaceTrackingConfiguration",
    }
}

catalog! {
    /// The six life-cycle event channels the engine emits on.
    ///
    /// This set is a closed contract; a new event kind requires a catalog
    /// update on both sides of the boundary.
    EventKind {
        FrameDidUpdate => "frameDidUpdate",
        DidFailWithError => "didFailWithError",
        AnchorsDidUpdate => "anchorsDidUpdate",
        CameraDidChangeTrackingState => "cameraDidChangeTrackingState",
        SessionWasInterrupted => "sessionWasInterrupted",
        SessionInterruptionEnded => "sessionInterruptionEnded",
    }
}

catalog! {
    /// Kind discriminator for engine-owned anchors.
    AnchorType {
        Face => "ARFaceAnchor",
        Image => "ARImageAnchor",
        Plane => "ARPlaneAnchor",
        Anchor => "ARAnchor",
    }
}

catalog! {
    /// What happened to an anchor in an `anchorsDidUpdate` event.
    AnchorUpdateKind {
        Add => "add",
        Update => "update",
        Remove => "remove",
    }
}

catalog! {
    /// Optional frame sub-fields an application can request when pulling a
    /// snapshot.
    FrameAttribute {
        Anchors => "anchors",
        RawFeaturePoints => "rawFeaturePoints",
        LightEstimation => "lightEstimation",
        CapturedDepthData => "capturedDepthData",
    }
}

catalog! {
    /// Whether and how the engine detects flat surfaces.
    PlaneDetection {
        /// No plane detection is run.
        None => "none",
        /// Detect horizontal planes in the scene.
        Horizontal => "horizontal",
        /// Detect vertical planes in the scene.
        Vertical => "vertical",
    }
}

catalog! {
    /// Geometry classes a hit-test query can intersect, and the class a
    /// result reports back.
    HitTestResultType {
        /// Nearest raw feature point.
        FeaturePoint => "featurePoint",
        /// Horizontal plane estimate for the current frame.
        HorizontalPlane => "horizontalPlane",
        /// Vertical plane estimate for the current frame.
        VerticalPlane => "verticalPlane",
        /// An existing plane anchor.
        ExistingPlane => "existingPlane",
        /// An existing plane anchor, limited to its extent.
        ExistingPlaneUsingExtent => "existingPlaneUsingExtent",
        /// An existing plane anchor, limited to its geometry.
        ExistingPlaneUsingGeometry => "existingPlaneUsingGeometry",
    }
}

catalog! {
    /// How the engine anchors the session coordinate system to the world.
    WorldAlignment {
        /// Gravity down the -Y axis.
        Gravity => "gravity",
        /// Gravity down -Y, -Z toward true north.
        GravityAndHeading => "gravityAndHeading",
        /// Aligned with the camera's orientation.
        AlignmentCamera => "alignmentCamera",
    }
}

catalog! {
    /// Quality of the engine's world tracking.
    TrackingState {
        NotAvailable => "ARTrackingStateNotAvailable",
        /// Tracking is degraded; see [`TrackingStateReason`].
        Limited => "ARTrackingStateLimited",
        Normal => "ARTrackingStateNormal",
    }
}

catalog! {
    /// Why tracking is limited.
    TrackingStateReason {
        None => "ARTrackingStateReasonNone",
        Initializing => "ARTrackingStateReasonInitializing",
        ExcessiveMotion => "ARTrackingStateReasonExcessiveMotion",
        InsufficientFeatures => "ARTrackingStateReasonInsufficientFeatures",
        Relocalizing => "ARTrackingStateReasonRelocalizing",
    }
}

catalog! {
    /// Facial-expression coefficients reported under face tracking.
    ///
    /// One coefficient per tracked muscle group, in the engine's canonical
    /// order. Left/right suffixes are from the face's own perspective.
    BlendShape {
        BrowDownL => "browDown_L",
        BrowDownR => "browDown_R",
        BrowInnerUp => "browInnerUp",
        BrowOuterUpL => "browOuterUp_L",
        BrowOuterUpR => "browOuterUp_R",
        CheekPuff => "cheekPuff",
        CheekSquintL => "cheekSquint_L",
        CheekSquintR => "cheekSquint_R",
        EyeBlinkL => "eyeBlink_L",
        EyeBlinkR => "eyeBlink_R",
        EyeLookDownL => "eyeLookDown_L",
        EyeLookDownR => "eyeLookDown_R",
        EyeLookInL => "eyeLookIn_L",
        EyeLookInR => "eyeLookIn_R",
        EyeLookOutL => "eyeLookOut_L",
        EyeLookOutR => "eyeLookOut_R",
        EyeLookUpL => "eyeLookUp_L",
        EyeLookUpR => "eyeLookUp_R",
        EyeSquintL => "eyeSquint_L",
        EyeSquintR => "eyeSquint_R",
        EyeWideL => "eyeWide_L",
        EyeWideR => "eyeWide_R",
        JawForward => "jawForward",
        JawLeft => "jawLeft",
        JawOpen => "jawOpen",
        JawRight => "jawRight",
        MouthClose => "mouthClose",
        MouthDimpleL => "mouthDimple_L",
        MouthDimpleR => "mouthDimple_R",
        MouthFrownL => "mouthFrown_L",
        MouthFrownR => "mouthFrown_R",
        MouthFunnel => "mouthFunnel",
        MouthLeft => "mouthLeft",
        MouthLowerDownL => "mouthLowerDown_L",
        MouthLowerDownR => "mouthLowerDown_R",
        MouthPressL => "mouthPress_L",
        MouthPressR => "mouthPress_R",
        MouthPucker => "mouthPucker",
        MouthRight => "mouthRight",
        MouthRollLower => "mouthRollLower",
        MouthRollUpper => "mouthRollUpper",
        MouthShrugLower => "mouthShrugLower",
        MouthShrugUpper => "mouthShrugUpper",
        MouthSmileL => "mouthSmile_L",
        MouthSmileR => "mouthSmile_R",
        MouthStretchL => "mouthStretch_L",
        MouthStretchR => "mouthStretch_R",
        MouthUpperUpL => "mouthUpperUp_L",
        MouthUpperUpR => "mouthUpperUp_R",
        NoseSneerL => "noseSneer_L",
        NoseSneerR => "noseSneer_R",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn configuration_identifiers_are_verbatim() {
        assert_eq!(
            TrackingConfiguration::World.as_str(),
            "ARWorldTrackingConfiguration"
        );
        assert_eq!(
            TrackingConfiguration::Orientation.as_str(),
            "AROrientationTrackingConfiguration"
        );
        assert_eq!(
            TrackingConfiguration::Face.as_str(),
            "ARFaceTrackingConfiguration"
        );
    }

    #[test]
    fn event_kind_has_exactly_six_channels() {
        assert_eq!(EventKind::ALL.len(), 6);
        assert_eq!(EventKind::FrameDidUpdate.as_str(), "frameDidUpdate");
        assert_eq!(
            EventKind::SessionInterruptionEnded.as_str(),
            "sessionInterruptionEnded"
        );
    }

    #[test]
    fn tracking_state_identifiers_carry_engine_prefix() {
        assert_eq!(TrackingState::Limited.as_str(), "ARTrackingStateLimited");
        assert_eq!(
            TrackingStateReason::ExcessiveMotion.as_str(),
            "ARTrackingStateReasonExcessiveMotion"
        );
    }

    #[test]
    fn blend_shape_catalog_is_complete() {
        assert_eq!(BlendShape::ALL.len(), 52);
        assert_eq!(BlendShape::BrowDownL.as_str(), "browDown_L");
        assert_eq!(BlendShape::NoseSneerR.as_str(), "noseSneer_R");
    }

    #[test]
    fn parse_round_trips_through_the_verbatim_identifier() {
        for kind in EventKind::ALL {
            assert_eq!(EventKind::from_str(kind.as_str()).unwrap(), *kind);
        }
        for anchor in AnchorType::ALL {
            assert_eq!(AnchorType::from_str(anchor.as_str()).unwrap(), *anchor);
        }
    }

    #[test]
    fn parse_rejects_unknown_identifiers() {
        let err = TrackingConfiguration::from_str("ARBodyTrackingConfiguration").unwrap_err();
        assert_eq!(err.catalog, "TrackingConfiguration");
        assert_eq!(err.value, "ARBodyTrackingConfiguration");
    }

    #[test]
    fn serde_uses_the_wire_identifier() {
        let json = serde_json::to_string(&AnchorType::Face).unwrap();
        assert_eq!(json, "\"ARFaceAnchor\"");
        let parsed: PlaneDetection = serde_json::from_str("\"horizontal\"").unwrap();
        assert_eq!(parsed, PlaneDetection::Horizontal);
    }
}
