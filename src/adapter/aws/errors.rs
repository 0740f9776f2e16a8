//! AWS CLI Error Classification
//!
//! `aws` コマンドの標準エラー出力からエラーを分類する

use crate::domain::errors::ObjectStoreError;

/// Bucket does not exist
pub fn is_missing_bucket_error(stderr: &str) -> bool {
    stderr.contains("NoSuchBucket") || stderr.contains("specified bucket does not exist")
}

/// Credentials are missing, expired or not allowed to write
pub fn is_access_error(stderr: &str) -> bool {
    stderr.contains("AccessDenied")
        || stderr.contains("Access Denied")
        || stderr.contains("InvalidAccessKeyId")
        || stderr.contains("SignatureDoesNotMatch")
        || stderr.contains("ExpiredToken")
        || stderr.contains("Unable to locate credentials")
        || stderr.contains("The config profile")
        || stderr.contains("KMS.AccessDeniedException")
}

/// Map a failed `aws` invocation to a domain error
pub fn classify_stderr(bucket: &str, stderr: &str) -> ObjectStoreError {
    let message = last_line(stderr);
    if is_missing_bucket_error(stderr) {
        ObjectStoreError::BucketNotFound(bucket.to_string())
    } else if is_access_error(stderr) {
        ObjectStoreError::AccessDenied(message)
    } else {
        ObjectStoreError::Other(message)
    }
}

fn last_line(stderr: &str) -> String {
    stderr
        .lines()
        .rev()
        .map(str::trim)
        .find(|l| !l.is_empty())
        .unwrap_or("aws exited with an error")
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_bucket() {
        let stderr = "\nAn error occurred (NoSuchBucket) when calling the PutObject operation: The specified bucket does not exist\n";
        assert_eq!(
            classify_stderr("tf-states", stderr),
            ObjectStoreError::BucketNotFound("tf-states".to_string())
        );
    }

    #[test]
    fn test_access_errors() {
        assert!(is_access_error(
            "An error occurred (AccessDenied) when calling the PutObject operation: Access Denied"
        ));
        assert!(is_access_error("Unable to locate credentials. You can configure credentials by running \"aws configure\"."));
        assert!(is_access_error("An error occurred (ExpiredToken) when calling the PutObject operation"));
        assert!(matches!(
            classify_stderr("b", "The config profile (prod) could not be found"),
            ObjectStoreError::AccessDenied(_)
        ));
    }

    #[test]
    fn test_other_errors_are_retryable() {
        let err = classify_stderr(
            "b",
            "upload failed\nAn error occurred (SlowDown) when calling the PutObject operation: Please reduce your request rate.",
        );
        assert!(matches!(&err, ObjectStoreError::Other(m) if m.contains("SlowDown")));
        assert!(!err.is_configuration_fault());
    }

    #[test]
    fn test_empty_stderr() {
        assert_eq!(
            classify_stderr("b", "  \n"),
            ObjectStoreError::Other("aws exited with an error".to_string())
        );
    }
}
