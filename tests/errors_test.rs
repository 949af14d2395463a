#[cfg(test)]
mod error_tests {
    use resolens::errors::MediaError;
    use std::error::Error;

    #[test]
    fn test_permission_denied_display() {
        let error = MediaError::PermissionDenied("Access denied".to_string());
        assert!(error.to_string().contains("Camera permission denied"));
        assert!(error.to_string().contains("Access denied"));
    }

    #[test]
    fn test_overconstrained_display() {
        let error = MediaError::Overconstrained("width Exact(7680)".to_string());
        assert_eq!(
            error.to_string(),
            "Constraints not satisfiable: width Exact(7680)"
        );
    }

    #[test]
    fn test_error_names_match_variants() {
        let cases = [
            (
                MediaError::PermissionDenied(String::new()),
                "PermissionDenied",
            ),
            (MediaError::NotFound(String::new()), "NotFound"),
            (MediaError::Overconstrained(String::new()), "Overconstrained"),
            (MediaError::NotReadable(String::new()), "NotReadable"),
            (MediaError::TrackEnded(String::new()), "TrackEnded"),
            (MediaError::InvalidArgument(String::new()), "InvalidArgument"),
            (MediaError::Backend(String::new()), "Backend"),
        ];

        for (error, name) in cases {
            assert_eq!(error.name(), name);
        }
    }

    #[test]
    fn test_debug_format_names_variant() {
        let error = MediaError::NotReadable("Debug test".to_string());
        let debug_str = format!("{:?}", error);
        assert!(debug_str.contains("NotReadable"));
        assert!(debug_str.contains("Debug test"));
    }

    #[test]
    fn test_implements_error_trait() {
        let error = MediaError::PermissionDenied("Error trait test".to_string());
        let _error_trait: &dyn Error = &error;
        assert!(error.source().is_none());
    }

    #[test]
    fn test_all_variants_display_nonempty() {
        let errors = vec![
            MediaError::PermissionDenied("Permission error".to_string()),
            MediaError::NotFound("Lookup error".to_string()),
            MediaError::Overconstrained("Constraint error".to_string()),
            MediaError::NotReadable("Read error".to_string()),
            MediaError::TrackEnded("Track error".to_string()),
            MediaError::InvalidArgument("Argument error".to_string()),
            MediaError::Backend("Backend error".to_string()),
        ];

        for error in errors {
            assert!(!error.to_string().is_empty());
            assert!(!error.name().is_empty());
        }
    }
}

#[cfg(test)]
mod session_error_tests {
    use resolens::errors::MediaError;
    use resolens::session::SessionError;

    #[test]
    fn test_media_errors_pass_through_transparently() {
        let media = MediaError::Overconstrained("width".to_string());
        let session: SessionError = media.clone().into();
        assert_eq!(session.to_string(), media.to_string());
    }

    #[test]
    fn test_precondition_errors_have_their_own_messages() {
        assert_eq!(SessionError::NoActiveStream.to_string(), "no active stream");
        assert_eq!(
            SessionError::NoVideoTrack.to_string(),
            "stream has no video track"
        );
    }
}
