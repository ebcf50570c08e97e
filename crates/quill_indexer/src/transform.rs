/// An owned, asynchronous step of the ingestion pipeline.
pub trait Transform {
    type In;
    type Out;
    fn transform(self, input: Self::In) -> impl Future<Output = anyhow::Result<Self::Out>>;
}

pub trait TransformOps: Sized {
    fn pipe<Other>(self, other: Other) -> Pipe<Self, Other> {
        Pipe(self, other)
    }
}

impl<T: Transform> TransformOps for T {}

pub struct Pipe<T1, T2>(T1, T2);

impl<T1: Transform, T2: Transform> Transform for Pipe<T1, T2>
where
    T1::Out: Into<T2::In>,
{
    type In = T1::In;
    type Out = T2::Out;
    async fn transform(self, input: Self::In) -> anyhow::Result<Self::Out> {
        let intermediate_result = self.0.transform(input).await?;
        self.1.transform(intermediate_result.into()).await
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    struct Double;
    impl Transform for Double {
        type In = u32;
        type Out = u32;
        async fn transform(self, input: u32) -> anyhow::Result<u32> {
            Ok(input * 2)
        }
    }

    struct Describe;
    impl Transform for Describe {
        type In = u64;
        type Out = String;
        async fn transform(self, input: u64) -> anyhow::Result<String> {
            Ok(format!("n={input}"))
        }
    }

    struct Fail;
    impl Transform for Fail {
        type In = u32;
        type Out = u32;
        async fn transform(self, _: u32) -> anyhow::Result<u32> {
            anyhow::bail!("boom")
        }
    }

    #[tokio::test]
    async fn test_pipe_converts_between_steps() {
        let actual = Double.pipe(Double).pipe(Describe).transform(5).await.unwrap();
        let expected = "n=20";
        assert_eq!(actual, expected);
    }

    #[tokio::test]
    async fn test_pipe_short_circuits_on_error() {
        let actual = Fail.pipe(Describe).transform(1).await;
        assert!(actual.is_err());
    }
}
