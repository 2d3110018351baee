mod test;

use glam::Mat4;

//double buffered pose of a rigid body, written once per fixed physics step and
//read by render code with an interpolation factor to smooth over the rate
//mismatch between the two loops
pub struct PhysicsTransformState
{
    previous_transform: Mat4,
    current_transform: Mat4,
}

impl PhysicsTransformState
{
    pub fn new(transform: Mat4) -> Self
    {
        return PhysicsTransformState
        {
            previous_transform: transform,
            current_transform: transform,
        };
    }

    pub fn update_transform(&mut self, new_transform: Mat4)
    {
        self.previous_transform = self.current_transform;
        self.current_transform = new_transform;
    }

    pub fn current_transform(&self) -> Mat4
    {
        return self.current_transform;
    }

    //alpha outside [0, 1] lands on the corresponding stored transform, so the
    //decompose path never extrapolates
    pub fn get_interpolated_transform(&self, alpha: f32) -> Mat4
    {
        if self.current_transform == self.previous_transform
        {
            return self.current_transform;
        }
        if alpha >= 1.0
        {
            return self.current_transform;
        }
        if alpha <= 0.0
        {
            return self.previous_transform;
        }

        //decomposing drops any shear or perspective the inputs carried
        let (scale1, rotation1, translation1) = self.current_transform.to_scale_rotation_translation();
        let (scale2, rotation2, translation2) = self.previous_transform.to_scale_rotation_translation();

        let translation = translation2.lerp(translation1, alpha);
        let rotation = rotation2.slerp(rotation1, alpha);
        let scale = scale2.lerp(scale1, alpha);

        return Mat4::from_scale_rotation_translation(scale, rotation, translation);
    }
}

//fixed timestep accumulator. Frame time goes in, a step count to simulate
//comes out, and the leftover becomes the interpolation alpha for rendering
pub struct FixedStepClock
{
    step_size: f32,
    accumulator: f32,
}

impl FixedStepClock
{
    //a frame is never allowed to queue up more catch-up work than this
    const MAX_STEPS_PER_FRAME: usize = 5;

    pub fn new(step_size: f32) -> Self
    {
        if step_size <= 0.0
        {
            panic!("A fixed step clock needs a positive step size.");
        }
        return FixedStepClock
        {
            step_size: step_size,
            accumulator: 0.0,
        };
    }

    pub fn advance(&mut self, frame_delta: f32) -> usize
    {
        self.accumulator += frame_delta;
        let mut steps = 0;
        while self.accumulator >= self.step_size && steps < Self::MAX_STEPS_PER_FRAME
        {
            self.accumulator -= self.step_size;
            steps += 1;
        }
        if self.accumulator >= self.step_size
        {
            //the frame fell too far behind, drop the debt instead of spiraling
            self.accumulator = self.step_size;
        }
        return steps;
    }

    pub fn alpha(&self) -> f32
    {
        return self.accumulator / self.step_size;
    }

    pub fn step_size(&self) -> f32
    {
        return self.step_size;
    }
}
