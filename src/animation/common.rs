#[derive(Clone, Copy)]
pub struct NormalizedFloat
{
    val: f32,
}

impl NormalizedFloat
{
    pub fn clamped(val : f32) -> Self
    {
        return NormalizedFloat{ val : val.clamp(0.0, 1.0) };
    }

    pub fn zero() -> Self
    {
        return NormalizedFloat{ val : 0.0 };
    }

    pub fn get_val(&self) -> f32
    {
        return self.val;
    }
}
